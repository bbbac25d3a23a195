//! CSV encoding and decoding for portable exports
//!
//! Each item kind gets its own table with kind-specific columns, followed by
//! the common `Vault`, `Category`, `Favorite`, `Updated`, `Created` columns.
//! The card kind's single `expiry` field ("MM/YYYY") is split into separate
//! `Expiry Month` / `Expiry Year` columns on encode and rejoined on decode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{HavenError, HavenResult};
use crate::models::{Category, CategoryId, Item, ItemKind, Vault, VaultId};

/// Columns shared by every item table, appended after the kind-specific ones
const COMMON_COLUMNS: [&str; 5] = ["Vault", "Category", "Favorite", "Updated", "Created"];

/// File name for a kind's item table inside an archive
pub fn items_file_name(kind: ItemKind) -> String {
    format!("items_{}.csv", kind)
}

/// Recover the item kind from an archive entry name.
///
/// Accepts both `items_<kind>.csv` and a bare `<kind>.csv`, with or without
/// a leading directory component.
pub fn kind_from_file_name(name: &str) -> Option<ItemKind> {
    let base = name.rsplit('/').next()?;
    let stem = base.strip_suffix(".csv")?;
    let tag = stem.strip_prefix("items_").unwrap_or(stem);
    ItemKind::from_tag(tag)
}

/// Full header row for a kind's table
fn headers_for(kind: ItemKind) -> Vec<&'static str> {
    let mut headers: Vec<&'static str> = Vec::new();
    for (column, _) in kind.columns() {
        if kind == ItemKind::Card && *column == "CVV" {
            headers.push("Expiry Month");
            headers.push("Expiry Year");
        }
        headers.push(column);
    }
    headers.extend(COMMON_COLUMNS);
    headers
}

/// Encode items of a single kind into a CSV table
pub fn encode_items<'a, I>(items: I, kind: ItemKind) -> HavenResult<String>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers_for(kind))
        .map_err(|e| HavenError::Parse(format!("Failed to write CSV header: {}", e)))?;

    for item in items {
        let mut row: Vec<String> = Vec::new();
        for (column, field) in kind.columns() {
            if kind == ItemKind::Card && *column == "CVV" {
                let (month, year) = split_expiry(item.field("expiry"));
                row.push(month);
                row.push(year);
            }
            row.push(item.field(field).to_string());
        }
        row.push(item.vault_id.as_uuid().to_string());
        row.push(
            item.category
                .map(|c| c.as_uuid().to_string())
                .unwrap_or_default(),
        );
        row.push(if item.favorite { "true" } else { "false" }.to_string());
        row.push(item.updated_at.to_rfc3339());
        row.push(item.created_at.to_rfc3339());
        writer
            .write_record(&row)
            .map_err(|e| HavenError::Parse(format!("Failed to write CSV row: {}", e)))?;
    }

    finish_writer(writer)
}

/// Encode vaults into a CSV table
pub fn encode_vaults<'a, I>(vaults: I) -> HavenResult<String>
where
    I: IntoIterator<Item = &'a Vault>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["ID", "Name", "Description", "Icon", "Shared", "Notes", "Created"])
        .map_err(|e| HavenError::Parse(format!("Failed to write CSV header: {}", e)))?;

    for vault in vaults {
        writer
            .write_record([
                vault.id.as_uuid().to_string(),
                vault.name.clone(),
                vault.description.clone().unwrap_or_default(),
                vault.icon.clone(),
                if vault.shared { "true" } else { "false" }.to_string(),
                vault.notes.clone().unwrap_or_default(),
                vault.created_at.to_rfc3339(),
            ])
            .map_err(|e| HavenError::Parse(format!("Failed to write CSV row: {}", e)))?;
    }

    finish_writer(writer)
}

/// Encode categories into a CSV table
pub fn encode_categories<'a, I>(categories: I) -> HavenResult<String>
where
    I: IntoIterator<Item = &'a Category>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["ID", "Name", "Color"])
        .map_err(|e| HavenError::Parse(format!("Failed to write CSV header: {}", e)))?;

    for category in categories {
        writer
            .write_record([
                category.id.as_uuid().to_string(),
                category.name.clone(),
                category.color.clone(),
            ])
            .map_err(|e| HavenError::Parse(format!("Failed to write CSV row: {}", e)))?;
    }

    finish_writer(writer)
}

/// Parse a CSV table into header-keyed row maps.
///
/// Empty cells are omitted from the map. Unparseable CSV fails the whole
/// table with a single parse error.
pub fn parse_rows(text: &str) -> HavenResult<Vec<BTreeMap<String, String>>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| HavenError::Parse(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| HavenError::Parse(format!("Failed to parse CSV row: {}", e)))?;
        let mut row = BTreeMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if !value.is_empty() {
                row.insert(header.clone(), value.to_string());
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Decode a kind's item table back into items.
///
/// Every decoded item gets a fresh ID. Unresolvable vault references fall
/// back to the nil vault so the store rejects them on insert.
pub fn decode_items(text: &str, kind: ItemKind) -> HavenResult<Vec<Item>> {
    let rows = parse_rows(text)?;
    let mut items = Vec::with_capacity(rows.len());

    for row in rows {
        let vault_id = row
            .get("Vault")
            .and_then(|v| VaultId::parse(v).ok())
            .unwrap_or_else(VaultId::nil);

        let mut item = Item::new(vault_id, kind);
        for (column, field) in kind.columns() {
            if let Some(value) = row.get(*column) {
                item.fields.insert(field.to_string(), value.clone());
            }
        }
        if kind == ItemKind::Card {
            if let Some(expiry) = join_expiry(
                row.get("Expiry Month").map(String::as_str).unwrap_or(""),
                row.get("Expiry Year").map(String::as_str).unwrap_or(""),
            ) {
                item.fields.insert("expiry".to_string(), expiry);
            }
        }
        item.retain_valid_fields();

        item.category = row.get("Category").and_then(|c| CategoryId::parse(c).ok());
        item.favorite = row.get("Favorite").map(String::as_str) == Some("true");
        if let Some(updated) = row.get("Updated").and_then(|v| parse_timestamp(v)) {
            item.updated_at = updated;
        }
        if let Some(created) = row.get("Created").and_then(|v| parse_timestamp(v)) {
            item.created_at = created;
        }
        items.push(item);
    }
    Ok(items)
}

/// Decode a vault table, preserving IDs where they parse
pub fn decode_vaults(text: &str) -> HavenResult<Vec<Vault>> {
    let rows = parse_rows(text)?;
    let mut vaults = Vec::with_capacity(rows.len());

    for row in rows {
        let mut vault = Vault::new(row.get("Name").cloned().unwrap_or_default());
        if let Some(id) = row.get("ID").and_then(|v| VaultId::parse(v).ok()) {
            vault.id = id;
        }
        vault.description = row.get("Description").cloned();
        vault.icon = row.get("Icon").cloned().unwrap_or_default();
        vault.shared = row.get("Shared").map(String::as_str) == Some("true");
        vault.notes = row.get("Notes").cloned();
        if let Some(created) = row.get("Created").and_then(|v| parse_timestamp(v)) {
            vault.created_at = created;
        }
        vaults.push(vault);
    }
    Ok(vaults)
}

/// Decode a category table, preserving IDs where they parse
pub fn decode_categories(text: &str) -> HavenResult<Vec<Category>> {
    let rows = parse_rows(text)?;
    let mut categories = Vec::with_capacity(rows.len());

    for row in rows {
        let mut category = Category::new(
            row.get("Name").cloned().unwrap_or_default(),
            row.get("Color").cloned().unwrap_or_default(),
        );
        if let Some(id) = row.get("ID").and_then(|v| CategoryId::parse(v).ok()) {
            category.id = id;
        }
        categories.push(category);
    }
    Ok(categories)
}

fn finish_writer(writer: csv::Writer<Vec<u8>>) -> HavenResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| HavenError::Parse(format!("Failed to finish CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| HavenError::Parse(format!("CSV output not UTF-8: {}", e)))
}

/// Split a "MM/YYYY" expiry into month and year parts
fn split_expiry(expiry: &str) -> (String, String) {
    match expiry.split_once('/') {
        Some((month, year)) => (month.trim().to_string(), year.trim().to_string()),
        None => (expiry.trim().to_string(), String::new()),
    }
}

/// Rejoin expiry columns into the "MM/YYYY" bag field
fn join_expiry(month: &str, year: &str) -> Option<String> {
    let (month, year) = (month.trim(), year.trim());
    if month.is_empty() && year.is_empty() {
        None
    } else {
        Some(format!("{}/{}", month, year))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_roundtrip() {
        let vault_id = VaultId::new();
        let item = Item::new(vault_id, ItemKind::Login)
            .with_field("name", "GitHub")
            .with_field("username", "kaylee")
            .with_field("password", "hunter2")
            .with_field("url", "https://github.com")
            .with_field("totp", "JBSWY3DPEHPK3PXP");

        let csv = encode_items([&item], ItemKind::Login).unwrap();
        let decoded = decode_items(&csv, ItemKind::Login).unwrap();

        assert_eq!(decoded.len(), 1);
        let back = &decoded[0];
        assert_eq!(back.field("username"), "kaylee");
        assert_eq!(back.field("url"), "https://github.com");
        assert_eq!(back.field("totp"), "JBSWY3DPEHPK3PXP");
        assert_eq!(back.vault_id, vault_id);
        assert_ne!(back.id, item.id);
    }

    #[test]
    fn test_card_expiry_split_and_rejoin() {
        let item = Item::new(VaultId::new(), ItemKind::Card)
            .with_field("name", "Visa")
            .with_field("card_number", "4111111111111111")
            .with_field("expiry", "09/2027");

        let csv = encode_items([&item], ItemKind::Card).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.contains("Expiry Month"));
        assert!(header.contains("Expiry Year"));
        assert!(!header.contains(",expiry,"));

        let decoded = decode_items(&csv, ItemKind::Card).unwrap();
        assert_eq!(decoded[0].field("expiry"), "09/2027");
    }

    #[test]
    fn test_favorite_round_trips_as_literal_true() {
        let mut item = Item::new(VaultId::new(), ItemKind::Note).with_field("name", "Codes");
        item.favorite = true;

        let csv = encode_items([&item], ItemKind::Note).unwrap();
        assert!(csv.contains(",true,"));

        let decoded = decode_items(&csv, ItemKind::Note).unwrap();
        assert!(decoded[0].favorite);
    }

    #[test]
    fn test_bad_vault_reference_falls_back_to_nil() {
        let csv = "Name,Notes,Vault,Category,Favorite,Updated,Created\n\
                   Orphan,,not-a-uuid,,false,,\n";
        let decoded = decode_items(csv, ItemKind::Note).unwrap();
        assert_eq!(decoded[0].vault_id, VaultId::nil());
    }

    #[test]
    fn test_malformed_csv_is_a_parse_error() {
        let bad = "Name,Notes\n\"unterminated,oops\n";
        let err = decode_items(bad, ItemKind::Note).unwrap_err();
        assert!(matches!(err, HavenError::Parse(_)));
    }

    #[test]
    fn test_vault_roundtrip_preserves_id() {
        let mut vault = Vault::with_icon("Personal", "home");
        vault.description = Some("Daily use".to_string());
        vault.shared = true;

        let csv = encode_vaults([&vault]).unwrap();
        let decoded = decode_vaults(&csv).unwrap();

        assert_eq!(decoded[0].id, vault.id);
        assert_eq!(decoded[0].name, "Personal");
        assert_eq!(decoded[0].description.as_deref(), Some("Daily use"));
        assert!(decoded[0].shared);
    }

    #[test]
    fn test_category_roundtrip() {
        let category = Category::new("Finance", "#2ecc71");
        let csv = encode_categories([&category]).unwrap();
        let decoded = decode_categories(&csv).unwrap();
        assert_eq!(decoded[0].id, category.id);
        assert_eq!(decoded[0].color, "#2ecc71");
    }

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(kind_from_file_name("items_login.csv"), Some(ItemKind::Login));
        assert_eq!(kind_from_file_name("items_ssh-key.csv"), Some(ItemKind::SshKey));
        assert_eq!(kind_from_file_name("card.csv"), Some(ItemKind::Card));
        assert_eq!(
            kind_from_file_name("export/items_wifi.csv"),
            Some(ItemKind::Wifi)
        );
        assert_eq!(kind_from_file_name("vaults.csv"), None);
        assert_eq!(kind_from_file_name("items_login.txt"), None);
    }

    #[test]
    fn test_fields_with_commas_and_quotes_survive() {
        let item = Item::new(VaultId::new(), ItemKind::Login)
            .with_field("name", "Bank, \"primary\"")
            .with_field("notes", "line one\nline two");

        let csv = encode_items([&item], ItemKind::Login).unwrap();
        let decoded = decode_items(&csv, ItemKind::Login).unwrap();
        assert_eq!(decoded[0].field("name"), "Bank, \"primary\"");
        assert_eq!(decoded[0].field("notes"), "line one\nline two");
    }
}
