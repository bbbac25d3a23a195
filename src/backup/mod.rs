//! Backup and restore orchestration

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{
    is_password_protected_archive, parse_portable_archive, BackupFormat, BackupOptions,
    BackupService, RestoreReport,
};
pub use progress::{ProgressEvent, ProgressSink, Stage};
