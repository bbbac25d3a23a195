//! The backup pipeline: collect, encode, encrypt, pack, record
//!
//! `BackupService` drives one export or restore run end to end against its
//! injected collaborators. A run either produces a complete artifact or
//! fails with no artifact at all; restore applies entities one at a time
//! and accumulates per-entity failures instead of aborting.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::{CryptoProvider, SecureString, SymmetricKey};
use crate::error::{HavenError, HavenResult};
use crate::export::{self, ArchiveEntry, Container};
use crate::models::{BackupBundle, Item, ItemKind};
use crate::store::ItemStore;

use super::progress::{ProgressEvent, ProgressSink, Stage};

/// The artifact formats a backup run can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFormat {
    /// Plain CSV tables in a single text blob
    Csv,
    /// Unencrypted deflate zip of CSV tables and attachments
    Archive,
    /// Password-locked zip, every entry encrypted
    LockedArchive,
    /// Encrypted versioned container, opened with a PIN
    Container,
}

impl BackupFormat {
    /// Tag recorded in backup history
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Archive => "zip",
            Self::LockedArchive => "zip+password",
            Self::Container => "hkb",
        }
    }

    /// Whether this format needs a PIN or password
    pub fn needs_secret(&self) -> bool {
        matches!(self, Self::LockedArchive | Self::Container)
    }
}

/// Options for a single backup run
#[derive(Debug)]
pub struct BackupOptions {
    pub format: BackupFormat,
    /// PIN for containers, password for locked archives
    pub secret: Option<SecureString>,
    /// Write attachment payloads into archive formats
    pub include_attachments: bool,
}

impl BackupOptions {
    pub fn new(format: BackupFormat) -> Self {
        Self {
            format,
            secret: None,
            include_attachments: true,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecureString::new(secret));
        self
    }
}

/// Outcome of a restore run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    /// Whether the artifact itself parsed and decrypted. Per-entity
    /// failures do not clear this flag.
    pub success: bool,
    pub vaults_restored: usize,
    pub categories_restored: usize,
    pub items_restored: usize,
    /// Human-readable entity failures, in encounter order
    pub errors: Vec<String>,
}

impl RestoreReport {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    /// One-line summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} vaults, {} categories, {} items restored ({} failed)",
            self.vaults_restored,
            self.categories_restored,
            self.items_restored,
            self.errors.len()
        )
    }
}

/// Drives backup and restore runs against an item store and a crypto
/// provider
pub struct BackupService<'a> {
    store: &'a dyn ItemStore,
    crypto: &'a dyn CryptoProvider,
}

impl<'a> BackupService<'a> {
    pub fn new(store: &'a dyn ItemStore, crypto: &'a dyn CryptoProvider) -> Self {
        Self { store, crypto }
    }

    /// Run a full backup and return the artifact bytes.
    ///
    /// Fails fast if the store has no unlocked session, before any data is
    /// read. On success a history record is written through the store.
    pub fn create_backup(
        &self,
        options: &BackupOptions,
        sink: &mut ProgressSink<'_>,
    ) -> HavenResult<Vec<u8>> {
        self.store.ensure_unlocked()?;

        sink(ProgressEvent::new(Stage::Preparing, 5, "Collecting vault data"));
        let bundle = self.collect()?;

        let bytes = match options.format {
            BackupFormat::Csv => {
                let text = render_csv_blob(&bundle, sink)?;
                text.into_bytes()
            }
            BackupFormat::Archive => {
                let entries =
                    build_entries(&bundle, options.include_attachments, Stage::Preparing, sink)?;
                sink(ProgressEvent::new(Stage::Compressing, 80, "Compressing archive"));
                export::create_archive(&entries)?
            }
            BackupFormat::LockedArchive => {
                let password = required_secret(options, "a password is required for locked archives")?;
                let entries =
                    build_entries(&bundle, options.include_attachments, Stage::Encrypting, sink)?;
                sink(ProgressEvent::new(Stage::Compressing, 80, "Compressing archive"));
                export::create_locked_archive(&entries, password, self.crypto)?
            }
            BackupFormat::Container => {
                let pin = required_secret(options, "a PIN is required for container backups")?;
                emit_kind_partitions(&bundle, Stage::Encrypting, sink);
                let container = export::create_container(&bundle, pin, self.crypto)?;
                sink(ProgressEvent::new(Stage::Compressing, 85, "Packing container"));
                container.to_bytes()?
            }
        };

        sink(ProgressEvent::new(Stage::Finalizing, 100, "Recording backup"));
        self.store
            .record_backup(options.format.tag(), bundle.item_count(), bytes.len())?;
        Ok(bytes)
    }

    /// Restore from an encrypted container file
    pub fn restore_from_container(
        &self,
        bytes: &[u8],
        pin: &str,
        account_key: Option<&SymmetricKey>,
    ) -> RestoreReport {
        let container = match Container::from_slice(bytes) {
            Ok(container) => container,
            Err(e) => return RestoreReport::failed(e.to_string()),
        };
        match export::open_container(&container, pin, account_key, self.crypto) {
            Ok(bundle) => self.apply_bundle(&bundle),
            Err(e) => RestoreReport::failed(e.to_string()),
        }
    }

    /// Restore from a zip archive, locked or plain
    pub fn restore_from_archive(&self, bytes: &[u8], password: Option<&str>) -> RestoreReport {
        let entries = if export::is_locked_archive(bytes) {
            let Some(password) = password else {
                return RestoreReport::failed("archive is password protected");
            };
            match export::decrypt_archive(bytes, password, self.crypto) {
                Ok(entries) => entries,
                Err(e) => return RestoreReport::failed(e.to_string()),
            }
        } else {
            match export::read_archive(bytes) {
                Ok(entries) => entries,
                Err(e) => return RestoreReport::failed(e.to_string()),
            }
        };

        let (bundle, mut entry_errors) = bundle_from_entries(&entries);
        let mut report = self.apply_bundle(&bundle);
        entry_errors.append(&mut report.errors);
        report.errors = entry_errors;
        report
    }

    /// Check a container's integrity and PIN without restoring anything
    pub fn validate_container(&self, bytes: &[u8], pin: &str) -> HavenResult<bool> {
        let container = Container::from_slice(bytes)?;
        if container.compute_integrity(self.crypto) != container.integrity {
            return Ok(false);
        }
        Ok(export::validate_pin(&container, pin, self.crypto))
    }

    /// Apply a decoded bundle to the store, vaults first, then categories,
    /// then items. Failures are collected, not thrown.
    fn apply_bundle(&self, bundle: &BackupBundle) -> RestoreReport {
        let mut report = RestoreReport {
            success: true,
            ..RestoreReport::default()
        };

        for vault in &bundle.vaults {
            match self.store.create_vault(vault) {
                Ok(()) => report.vaults_restored += 1,
                Err(e) => report.errors.push(format!("vault '{}': {}", vault.name, e)),
            }
        }
        for category in &bundle.categories {
            match self.store.create_category(category) {
                Ok(()) => report.categories_restored += 1,
                Err(e) => report
                    .errors
                    .push(format!("category '{}': {}", category.name, e)),
            }
        }
        for item in &bundle.items {
            match self.store.create_item(item) {
                Ok(()) => report.items_restored += 1,
                Err(e) => report.errors.push(format!("{}: {}", item.describe(), e)),
            }
        }
        report
    }

    fn collect(&self) -> HavenResult<BackupBundle> {
        Ok(BackupBundle {
            vaults: self.store.vaults()?,
            categories: self.store.categories()?,
            items: self.store.items()?,
            settings: self.store.settings()?,
        })
    }
}

/// Decode a plain archive into a bundle without touching any store
pub fn parse_portable_archive(bytes: &[u8]) -> Option<BackupBundle> {
    if export::is_locked_archive(bytes) {
        return None;
    }
    let entries = export::read_archive(bytes).ok()?;
    let (bundle, errors) = bundle_from_entries(&entries);
    if bundle.is_empty() && !errors.is_empty() {
        return None;
    }
    Some(bundle)
}

/// Whether the bytes are a locked archive needing a password
pub fn is_password_protected_archive(bytes: &[u8]) -> bool {
    export::is_locked_archive(bytes)
}

fn required_secret<'a>(options: &'a BackupOptions, what: &str) -> HavenResult<&'a str> {
    options
        .secret
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(SecureString::as_str)
        .ok_or_else(|| HavenError::MissingKey(what.to_string()))
}

/// Render the whole bundle as a single multi-table CSV text blob: vaults,
/// categories, then one table per non-empty kind, blank-line separated.
fn render_csv_blob(bundle: &BackupBundle, sink: &mut ProgressSink<'_>) -> HavenResult<String> {
    let mut tables = Vec::new();
    tables.push(export::encode_vaults(&bundle.vaults)?);
    tables.push(export::encode_categories(&bundle.categories)?);

    let partitions = bundle.items_by_kind();
    let total = partitions.len();
    for (index, (kind, items)) in partitions.into_iter().enumerate() {
        sink(
            ProgressEvent::new(
                Stage::Preparing,
                stage_percent(10, 80, index, total),
                format!("Exporting {} items", kind),
            )
            .with_counts(index + 1, total),
        );
        tables.push(export::encode_items(items, kind)?);
    }

    sink(ProgressEvent::new(Stage::Finalizing, 95, "Assembling export"));
    Ok(tables.join("\n"))
}

/// Build the archive entry list: entity tables plus attachments
fn build_entries(
    bundle: &BackupBundle,
    include_attachments: bool,
    stage: Stage,
    sink: &mut ProgressSink<'_>,
) -> HavenResult<Vec<ArchiveEntry>> {
    let verb = match stage {
        Stage::Encrypting => "Encrypting",
        _ => "Packing",
    };

    let mut entries = Vec::new();
    entries.push(ArchiveEntry::new(
        "vaults.csv",
        export::encode_vaults(&bundle.vaults)?.into_bytes(),
    ));
    entries.push(ArchiveEntry::new(
        "categories.csv",
        export::encode_categories(&bundle.categories)?.into_bytes(),
    ));

    let partitions = bundle.items_by_kind();
    let total = partitions.len();
    for (index, (kind, items)) in partitions.into_iter().enumerate() {
        sink(
            ProgressEvent::new(
                stage,
                stage_percent(10, 75, index, total),
                format!("{} {} items", verb, kind),
            )
            .with_counts(index + 1, total),
        );
        entries.push(ArchiveEntry::new(
            export::items_file_name(kind),
            export::encode_items(items.iter().copied(), kind)?.into_bytes(),
        ));
        if include_attachments && kind == ItemKind::File {
            for item in items {
                if let Some(entry) = attachment_entry(item) {
                    entries.push(entry);
                }
            }
        }
    }
    Ok(entries)
}

/// Attachment payload for a file item, when it carries one.
///
/// Payloads are held in the `content` bag field, base64 encoded; raw text
/// is taken verbatim as a fallback.
fn attachment_entry(item: &Item) -> Option<ArchiveEntry> {
    let file_name = item.field("file_name");
    let content = item.field("content");
    if file_name.is_empty() || content.is_empty() {
        return None;
    }
    let data = STANDARD
        .decode(content.trim())
        .unwrap_or_else(|_| content.as_bytes().to_vec());
    Some(ArchiveEntry::new(
        export::attachment_entry_name(&item.id, file_name),
        data,
    ))
}

fn emit_kind_partitions(bundle: &BackupBundle, stage: Stage, sink: &mut ProgressSink<'_>) {
    let partitions = bundle.items_by_kind();
    let total = partitions.len();
    for (index, (kind, _)) in partitions.into_iter().enumerate() {
        sink(
            ProgressEvent::new(
                stage,
                stage_percent(10, 75, index, total),
                format!("Encrypting {} items", kind),
            )
            .with_counts(index + 1, total),
        );
    }
}

/// Decode archive entries into a bundle, collecting per-entry parse errors
fn bundle_from_entries(entries: &[ArchiveEntry]) -> (BackupBundle, Vec<String>) {
    let mut bundle = BackupBundle::default();
    let mut errors = Vec::new();

    for entry in entries {
        if entry.name.starts_with("attachments/") {
            continue;
        }
        let text = match std::str::from_utf8(&entry.data) {
            Ok(text) => text,
            Err(_) => {
                errors.push(format!("{}: not valid UTF-8", entry.name));
                continue;
            }
        };
        let result = if entry.name == "vaults.csv" {
            export::decode_vaults(text).map(|mut v| bundle.vaults.append(&mut v))
        } else if entry.name == "categories.csv" {
            export::decode_categories(text).map(|mut c| bundle.categories.append(&mut c))
        } else if let Some(kind) = export::kind_from_file_name(&entry.name) {
            export::decode_items(text, kind).map(|mut i| bundle.items.append(&mut i))
        } else {
            continue;
        };
        if let Err(e) = result {
            errors.push(format!("{}: {}", entry.name, e));
        }
    }
    (bundle, errors)
}

/// Linear interpolation of the overall percentage within one stage
fn stage_percent(from: u8, to: u8, index: usize, total: usize) -> u8 {
    if total == 0 {
        return from;
    }
    let span = (to - from) as usize;
    from + (span * index / total) as u8
}
