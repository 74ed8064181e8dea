//! User-facing prompt texts, keyboards, and reply coercion.
//!
//! All dialog strings live here so the state machine stays free of
//! presentation. Texts match the production bot verbatim.

use crate::gateway::PromptOptions;
use crate::session::{EditTarget, FormVariant, SessionRecord};

pub const BTN_START_EVENT: &str = "Регистрация на мероприятие";
pub const BTN_START_VACANCY: &str = "Прислать CV для вакансии";
/// Inline button attached to relayed channel posts.
pub const BTN_REGISTER_FROM_POST: &str = "Записаться на мероприятие";

pub const BTN_SUBMIT: &str = "✅ Отправить";
pub const BTN_EDIT: &str = "✏️ Редактировать";
pub const BTN_BACK_TO_REVIEW: &str = "⬅️ Назад к просмотру";
pub const BTN_YES: &str = "Да";
pub const BTN_NO: &str = "Нет";

pub const BTN_EDIT_NAME: &str = "✏️ Изменить ФИО";
pub const BTN_EDIT_PHONE: &str = "📱 Изменить телефон";
pub const BTN_EDIT_EVENT: &str = "🎯 Изменить мероприятие";
pub const BTN_EDIT_VACANCY: &str = "💼 Изменить вакансию";
pub const BTN_EDIT_PASS: &str = "🪪 Изменить пропуск";
pub const BTN_EDIT_ABOUT: &str = "📝 Изменить информацию о себе";
pub const BTN_EDIT_CV: &str = "📎 Изменить CV";
pub const BTN_EDIT_HANDLE: &str = "👤 Изменить username";

pub const PROMPT_NAME: &str = "✏️ Введите ваше ФИО:";
pub const PROMPT_PHONE: &str = "📱 Введите ваш номер телефона:";
pub const PROMPT_EVENT: &str = "🎯 Пожалуйста, введите название мероприятия, на которое хотите зарегистрироваться (можно ориентироваться на название, указанное в посте канала):";
pub const PROMPT_VACANCY: &str = "💼 Пожалуйста, введите название вакансии, которая вас интересует (можно ориентироваться на название, указанное в посте канала):";
pub const PROMPT_PASS: &str =
    "🪪 Нужен ли вам пропуск в НИУ ВШЭ?\nВыберите нет, если мероприятие онлайн";
pub const PROMPT_ABOUT: &str = "📝 Пожалуйста, напишите несколько предложений, почему вас интересует данная вакансия и почему вы считаете себя подходящим кандидатом:";
pub const PROMPT_CV: &str = "📎 Прикрепите ваше CV (файл PDF или DOCX):";

pub const EDIT_MENU_TITLE: &str = "🔧 Что вы хотите изменить?";
pub const EDIT_PROMPT_NAME: &str = "✏️ Введите новое ФИО:";
pub const EDIT_PROMPT_PHONE: &str = "📱 Введите новый телефон:";
pub const EDIT_PROMPT_EVENT: &str = "🎯 Введите новое мероприятие:";
pub const EDIT_PROMPT_VACANCY: &str = "💼 Введите новую вакансию:";
pub const EDIT_PROMPT_PASS: &str = "🪪 Нужен ли вам пропуск?";
pub const EDIT_PROMPT_ABOUT: &str = "📝 Введите новую информацию о себе:";
pub const EDIT_PROMPT_CV: &str = "📎 Прикрепите новое CV (файл PDF или DOCX):";
pub const EDIT_PROMPT_HANDLE: &str = "👤 Введите новый username (без @):";

pub const INVALID_CHOICE: &str = "⚠️ Неверный выбор";
pub const STALE_SESSION: &str = "⌛️ Сессия устарела. Начните заново с /start";

pub const USER_MENU: &str = "👋 Привет! Это бот  мы активно делимся уникальными вакансиями, мероприятиями, а также организуем кейс-чемпионаты.\nЧто вас интересует?";
pub const SUBSCRIBED_NOTE: &str = "🔔 Вы подписаны на рассылку мероприятий и напоминаний. Чтобы отписаться, используйте команду /unsubscribe";
pub const UNSUBSCRIBED: &str = "🔕 Вы отписались от рассылки мероприятий и напоминаний.";
pub const NOT_SUBSCRIBED: &str = "ℹ️ Вы не подписаны на рассылку.";

pub const THANKS_EVENT: &str = "🎉 Спасибо за регистрацию!";
pub const THANKS_VACANCY: &str = "🎉 Спасибо за ваше резюме!";

/// Keyboard offered with the user menu.
pub fn user_menu_options() -> PromptOptions {
    PromptOptions::buttons([BTN_START_EVENT, BTN_START_VACANCY])
}

/// Keyboard offered with every rendered summary.
pub fn review_options() -> PromptOptions {
    PromptOptions::buttons([BTN_SUBMIT, BTN_EDIT])
}

/// Edit-menu keyboard for the given variant, "back" row last.
pub fn edit_menu_options(variant: FormVariant) -> PromptOptions {
    let mut buttons: Vec<&str> = match variant {
        FormVariant::Event => vec![
            BTN_EDIT_NAME,
            BTN_EDIT_PHONE,
            BTN_EDIT_EVENT,
            BTN_EDIT_PASS,
            BTN_EDIT_HANDLE,
        ],
        FormVariant::Vacancy => vec![
            BTN_EDIT_NAME,
            BTN_EDIT_PHONE,
            BTN_EDIT_VACANCY,
            BTN_EDIT_ABOUT,
            BTN_EDIT_CV,
            BTN_EDIT_HANDLE,
        ],
    };
    buttons.push(BTN_BACK_TO_REVIEW);
    PromptOptions::buttons(buttons)
}

/// Map an edit-menu reply to its target by exact label match.
///
/// The production bot matched on substrings anywhere in the reply,
/// which misfires on free text that happens to mention a field; only
/// the exact labels presented for the active variant are accepted.
pub fn match_edit_choice(variant: FormVariant, text: &str) -> Option<EditTarget> {
    match (variant, text) {
        (_, t) if t == BTN_EDIT_NAME => Some(EditTarget::Name),
        (_, t) if t == BTN_EDIT_PHONE => Some(EditTarget::Phone),
        (FormVariant::Event, t) if t == BTN_EDIT_EVENT => Some(EditTarget::Target),
        (FormVariant::Event, t) if t == BTN_EDIT_PASS => Some(EditTarget::Pass),
        (FormVariant::Vacancy, t) if t == BTN_EDIT_VACANCY => Some(EditTarget::Target),
        (FormVariant::Vacancy, t) if t == BTN_EDIT_ABOUT => Some(EditTarget::About),
        (FormVariant::Vacancy, t) if t == BTN_EDIT_CV => Some(EditTarget::Cv),
        (_, t) if t == BTN_EDIT_HANDLE => Some(EditTarget::Handle),
        _ => None,
    }
}

/// Prompt text and keyboard for one edit target.
pub fn edit_prompt(variant: FormVariant, target: EditTarget) -> (&'static str, PromptOptions) {
    match target {
        EditTarget::Name => (EDIT_PROMPT_NAME, PromptOptions::remove_keyboard()),
        EditTarget::Phone => (EDIT_PROMPT_PHONE, PromptOptions::remove_keyboard()),
        EditTarget::Target => match variant {
            FormVariant::Event => (EDIT_PROMPT_EVENT, PromptOptions::remove_keyboard()),
            FormVariant::Vacancy => (EDIT_PROMPT_VACANCY, PromptOptions::remove_keyboard()),
        },
        EditTarget::Pass => (EDIT_PROMPT_PASS, PromptOptions::buttons([BTN_YES, BTN_NO])),
        EditTarget::About => (EDIT_PROMPT_ABOUT, PromptOptions::remove_keyboard()),
        EditTarget::Cv => (EDIT_PROMPT_CV, PromptOptions::remove_keyboard()),
        EditTarget::Handle => (EDIT_PROMPT_HANDLE, PromptOptions::remove_keyboard()),
    }
}

/// Coerce a pass-field reply to a boolean.
///
/// Case-insensitive match against the affirmative set; anything else is
/// negative, never an error.
pub fn parse_yes(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered == "да" || lowered == "yes"
}

/// Normalize a username reply: strip one leading `@`, empty means unset.
pub fn normalize_handle(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

fn fmt_handle(handle: &Option<String>) -> String {
    match handle {
        Some(h) => format!("@{}", h),
        None => "@не указан".to_string(),
    }
}

fn fmt_missing(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("—")
}

/// Render the review summary from the latest field values.
pub fn render_summary(session: &SessionRecord) -> String {
    match session.variant {
        FormVariant::Event => format!(
            "✅ Ваша анкета на мероприятие:\n\n\
             📌 ФИО: {}\n\
             👤 Username: {}\n\
             📱 Телефон: {}\n\
             🎯 Мероприятие: {}\n\
             🪪 Пропуск: {}",
            fmt_missing(&session.display_name),
            fmt_handle(&session.handle),
            fmt_missing(&session.contact_phone),
            fmt_missing(&session.target_name),
            if session.needs_access_pass.unwrap_or(false) {
                "Да"
            } else {
                "Нет"
            },
        ),
        FormVariant::Vacancy => format!(
            "✅ Ваша анкета на вакансию:\n\n\
             📌 ФИО: {}\n\
             👤 Username: {}\n\
             📱 Телефон: {}\n\
             💼 Вакансия: {}\n\
             📝 О себе: {}\n\
             📎 CV: {}",
            fmt_missing(&session.display_name),
            fmt_handle(&session.handle),
            fmt_missing(&session.contact_phone),
            fmt_missing(&session.target_name),
            fmt_missing(&session.about_text),
            if session.attachment.is_some() {
                "Прикреплено"
            } else {
                "Отсутствует"
            },
        ),
    }
}
