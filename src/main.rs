//! intake-bot entry point.

use std::sync::Arc;

use clap::Parser;
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intake_bot::{
    config::Config,
    directory::{AdminDirectory, SubscriberList},
    dispatch::Dispatcher,
    flow::Flow,
    gateway::{ConsoleGate, MessageGate, UserId},
    ledger::Ledger,
    relay::Relay,
    report::JsonlExporter,
    sched::Scheduler,
    session::SessionStore,
};

#[derive(Parser, Debug)]
#[command(name = "intake-bot")]
#[command(about = "Conversational intake agent for registrations and applications")]
#[command(version)]
struct Args {
    /// Identity to impersonate on the console gate
    #[arg(long, default_value_t = 0)]
    identity: i64,

    /// Username reported with console replies
    #[arg(long)]
    handle: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intake_bot=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Starting intake-bot...");

    let config = Config::from_env()?;
    tracing::info!(
        admins = config.admins.main_admin_ids.len(),
        "Loaded configuration"
    );

    let store = Arc::new(SessionStore::new());
    let ledger = Arc::new(Ledger::new());
    let directory = Arc::new(AdminDirectory::new(&config.admins.main_admin_ids));
    let subscribers = Arc::new(SubscriberList::new());
    let exporter = Arc::new(JsonlExporter::new(config.export.dir.clone()));

    let gate: Arc<dyn MessageGate> =
        Arc::new(ConsoleGate::new(UserId(args.identity), args.handle));
    let relay = Arc::new(Relay::new(gate.clone(), subscribers.clone()));

    let scheduler = Arc::new(Scheduler::new(
        &config.mailing,
        &config.reminder,
        ledger.clone(),
        directory.clone(),
        subscribers.clone(),
        gate.clone(),
        exporter.clone(),
    ));
    tokio::spawn(scheduler.clone().run());
    tracing::info!("Scheduler started");

    let flow = Flow::new(
        store.clone(),
        gate.clone(),
        directory.clone(),
        ledger.clone(),
    );
    let dispatcher = Dispatcher::new(
        gate.clone(),
        store,
        flow,
        directory,
        subscribers,
        relay,
        scheduler,
        ledger,
        exporter,
    );

    let mut inbound = gate.start().await?;
    tracing::info!("Gate '{}' started, entering dispatch loop", gate.name());

    while let Some(msg) = inbound.next().await {
        dispatcher.handle(msg).await;
    }

    tracing::info!("Inbound stream closed, shutting down");
    Ok(())
}
