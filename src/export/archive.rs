//! Zip archive packing for portable exports
//!
//! Plain archives are ordinary deflate zips. Locked archives encrypt every
//! entry body with a single key derived from the user's password and a fixed
//! application salt, then store the blob under the original entry name with
//! an `.enc` suffix. The zip structure itself stays readable either way, so
//! lockedness can be detected without a password.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::crypto::CryptoProvider;
use crate::error::{HavenError, HavenResult};
use crate::models::ItemId;

/// Fixed application salt for archive password derivation (base64).
///
/// Locked archives carry no per-archive salt, so the same password always
/// derives the same key. Nonces are fresh per entry.
const ARCHIVE_KDF_SALT: &str = "aGF2ZW5rZXktYXJjaGl2ZQ";

/// Suffix marking an encrypted entry inside a locked archive
const LOCKED_SUFFIX: &str = ".enc";

/// One file inside an export archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Entry name for an item attachment, nested under the owning item's ID.
///
/// The file name is reduced to its final path component so attachment names
/// can never escape the `attachments/` subtree.
pub fn attachment_entry_name(item_id: &ItemId, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("attachment");
    format!("attachments/{}/{}", item_id.as_uuid(), base)
}

/// Pack entries into a plain deflate zip
pub fn create_archive(entries: &[ArchiveEntry]) -> HavenResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options.clone())?;
        writer.write_all(&entry.data)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Pack entries into a password-locked zip.
///
/// One key is derived from the password; each entry body is independently
/// encrypted and stored as an opaque blob string under `<name>.enc`.
pub fn create_locked_archive(
    entries: &[ArchiveEntry],
    password: &str,
    crypto: &dyn CryptoProvider,
) -> HavenResult<Vec<u8>> {
    let key = crypto.derive_key(password, ARCHIVE_KDF_SALT)?;

    let mut locked = Vec::with_capacity(entries.len());
    for entry in entries {
        let blob = crypto.encrypt(&entry.data, &key)?;
        locked.push(ArchiveEntry::new(
            format!("{}{}", entry.name, LOCKED_SUFFIX),
            blob.into_bytes(),
        ));
    }
    create_archive(&locked)
}

/// Read every file entry out of a zip
pub fn read_archive(bytes: &[u8]) -> HavenResult<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push(ArchiveEntry::new(file.name().to_string(), data));
    }
    Ok(entries)
}

/// Read a locked zip and decrypt every `.enc` entry.
///
/// A wrong password surfaces as a single [`HavenError::Authentication`] on
/// the first entry. Entries without the `.enc` suffix pass through verbatim.
pub fn decrypt_archive(
    bytes: &[u8],
    password: &str,
    crypto: &dyn CryptoProvider,
) -> HavenResult<Vec<ArchiveEntry>> {
    let entries = read_archive(bytes)?;
    let key = crypto.derive_key(password, ARCHIVE_KDF_SALT)?;

    let mut decrypted = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.name.strip_suffix(LOCKED_SUFFIX) {
            Some(name) => {
                let blob = String::from_utf8(entry.data).map_err(|_| {
                    HavenError::Archive(format!("Entry {} is not a valid blob", entry.name))
                })?;
                let data = crypto.decrypt(&blob, &key)?;
                decrypted.push(ArchiveEntry::new(name.to_string(), data));
            }
            None => decrypted.push(entry),
        }
    }
    Ok(decrypted)
}

/// Whether the bytes are a readable zip with encrypted entries
pub fn is_locked_archive(bytes: &[u8]) -> bool {
    match read_archive(bytes) {
        Ok(entries) => {
            !entries.is_empty() && entries.iter().all(|e| e.name.ends_with(LOCKED_SUFFIX))
        }
        Err(_) => false,
    }
}
