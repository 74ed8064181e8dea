//! Permanent-log export collaborator.
//!
//! The core only appends to the logs; turning them into a shareable
//! artifact is delegated behind [`ReportExporter`]. The bundled
//! implementation writes JSON lines to a spool directory and hands back
//! the path as an opaque attachment reference.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ExportError;
use crate::gateway::AttachmentRef;
use crate::ledger::RegistrationRecord;

/// Produces an attachment from a snapshot of the registration log.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export_registrations(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<AttachmentRef, ExportError>;
}

/// JSON-lines exporter writing into a spool directory.
pub struct JsonlExporter {
    dir: PathBuf,
}

impl JsonlExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ReportExporter for JsonlExporter {
    async fn export_registrations(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<AttachmentRef, ExportError> {
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let filename = format!(
            "registrations_{}.jsonl",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(filename);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, body).await?;

        Ok(AttachmentRef(path.to_string_lossy().into_owned()))
    }
}
