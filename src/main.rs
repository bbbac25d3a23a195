use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use havenkey::backup::{
    is_password_protected_archive, BackupFormat, BackupOptions, BackupService, ProgressEvent,
    RestoreReport,
};
use havenkey::crypto::StdCrypto;
use havenkey::export::Container;
use havenkey::models::BackupBundle;
use havenkey::store::MemoryStore;

#[derive(Parser)]
#[command(
    name = "havenkey",
    version,
    about = "Encrypted backup engine for a personal secrets vault",
    long_about = "Havenkey exports a vault of credentials and documents to plain CSV, \
                  zip archives (optionally password locked), or the encrypted .hkb \
                  container format, and restores a vault from any of them."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a vault file to a backup artifact
    Export {
        /// Vault bundle JSON file to export
        vault: PathBuf,

        /// Output artifact path
        #[arg(short, long)]
        output: PathBuf,

        /// Artifact format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Hkb)]
        format: FormatArg,

        /// PIN or password (prompted when omitted for encrypted formats)
        #[arg(short, long)]
        secret: Option<String>,

        /// Skip attachment payloads in archive formats
        #[arg(long)]
        no_attachments: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Restore a backup artifact into a vault file
    Restore {
        /// Backup artifact to restore from
        input: PathBuf,

        /// Vault bundle JSON file to restore into (created when absent)
        vault: PathBuf,

        /// PIN or password (prompted when omitted and required)
        #[arg(short, long)]
        secret: Option<String>,
    },

    /// Check a container's integrity and PIN without restoring
    Validate {
        /// Container file to check
        input: PathBuf,

        /// PIN (prompted when omitted)
        #[arg(short, long)]
        secret: Option<String>,
    },

    /// Describe a backup artifact without opening it
    Inspect {
        /// Artifact to describe
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Plain CSV tables
    Csv,
    /// Unencrypted zip archive
    Zip,
    /// Password-locked zip archive
    ZipLocked,
    /// Encrypted container
    Hkb,
}

impl From<FormatArg> for BackupFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Zip => Self::Archive,
            FormatArg::ZipLocked => Self::LockedArchive,
            FormatArg::Hkb => Self::Container,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            vault,
            output,
            format,
            secret,
            no_attachments,
            quiet,
        } => export(&vault, &output, format, secret, no_attachments, quiet),
        Commands::Restore {
            input,
            vault,
            secret,
        } => restore(&input, &vault, secret),
        Commands::Validate { input, secret } => validate(&input, secret),
        Commands::Inspect { input } => inspect(&input),
    }
}

fn export(
    vault_path: &Path,
    output: &Path,
    format: FormatArg,
    secret: Option<String>,
    no_attachments: bool,
    quiet: bool,
) -> Result<()> {
    let store = load_store(vault_path)?;
    let crypto = StdCrypto;
    let service = BackupService::new(&store, &crypto);

    let backup_format = BackupFormat::from(format);
    let mut options = BackupOptions::new(backup_format);
    options.include_attachments = !no_attachments;
    if backup_format.needs_secret() {
        let prompt = match backup_format {
            BackupFormat::Container => "Backup PIN: ",
            _ => "Archive password: ",
        };
        options = options.with_secret(obtain_secret(secret, prompt)?);
    }

    let mut sink = |event: ProgressEvent| {
        if !quiet {
            eprintln!("[{:>3}%] {}", event.percent, event.label);
        }
    };
    let bytes = service.create_backup(&options, &mut sink)?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} backup to {} ({} bytes)",
        backup_format.tag(),
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn restore(input: &Path, vault_path: &Path, secret: Option<String>) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let store = if vault_path.exists() {
        load_store(vault_path)?
    } else {
        MemoryStore::new()
    };
    let crypto = StdCrypto;
    let service = BackupService::new(&store, &crypto);

    let report = if Container::from_slice(&bytes).is_ok() {
        let pin = obtain_secret(secret, "Backup PIN: ")?;
        service.restore_from_container(&bytes, &pin, None)
    } else if is_password_protected_archive(&bytes) {
        let password = obtain_secret(secret, "Archive password: ")?;
        service.restore_from_archive(&bytes, Some(&password))
    } else {
        service.restore_from_archive(&bytes, None)
    };

    print_report(&report);
    if !report.success {
        bail!("restore failed");
    }

    save_store(&store, vault_path)?;
    println!("Vault written to {}", vault_path.display());
    Ok(())
}

fn validate(input: &Path, secret: Option<String>) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let pin = obtain_secret(secret, "Backup PIN: ")?;

    let store = MemoryStore::new();
    let crypto = StdCrypto;
    let service = BackupService::new(&store, &crypto);

    if service.validate_container(&bytes, &pin)? {
        println!("Container is intact and the PIN is correct");
        Ok(())
    } else {
        bail!("integrity check or PIN verification failed");
    }
}

fn inspect(input: &Path) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    if let Ok(container) = Container::from_slice(&bytes) {
        println!("Format:    encrypted container");
        println!("Version:   {}", container.version);
        println!("Created:   {}", container.timestamp.to_rfc3339());
        println!(
            "Layout:    {}",
            if container.wrapped_key.is_some() {
                "PIN-wrapped data key"
            } else {
                "legacy (account key required)"
            }
        );
        return Ok(());
    }

    if is_password_protected_archive(&bytes) {
        println!("Format:    password-locked zip archive");
        return Ok(());
    }
    if let Some(bundle) = havenkey::backup::parse_portable_archive(&bytes) {
        println!("Format:    plain zip archive");
        println!("Vaults:    {}", bundle.vaults.len());
        println!("Items:     {}", bundle.item_count());
        return Ok(());
    }

    bail!("not a recognized backup artifact");
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read vault file {}", path.display()))?;
    let bundle: BackupBundle = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid vault file", path.display()))?;
    Ok(MemoryStore::from_bundle(bundle))
}

fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.to_bundle())?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write vault file {}", path.display()))?;
    Ok(())
}

fn obtain_secret(flag: Option<String>, prompt: &str) -> Result<String> {
    match flag {
        Some(secret) => Ok(secret),
        None => rpassword::prompt_password(prompt).context("Failed to read secret"),
    }
}

fn print_report(report: &RestoreReport) {
    println!("{}", report.summary());
    for error in &report.errors {
        eprintln!("  skipped {}", error);
    }
}
