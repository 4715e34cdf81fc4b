//! Spreadsheet export/import for the inventory.
//!
//! The file is a single CSV table. Fixed columns come first, then one
//! column per custom field named by the field's display name, so a file
//! exported with one field set re-imports cleanly under the same set.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{CustomField, NewItem, ScannedItem, DEFAULT_CATEGORY};

pub const FIXED_HEADERS: [&str; 6] = [
    "Barcode",
    "Name",
    "Description",
    "Category",
    "Scanned At",
    "Last Updated",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A produced export file: suggested name plus CSV bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Why an import row was not turned into an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyBarcode,
    EmptyName,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyBarcode => write!(f, "barcode is empty"),
            RejectReason::EmptyName => write!(f, "name is empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line in the file, counting the header as line 1.
    pub line: u64,
    pub reason: RejectReason,
}

/// Per-row outcome of an import: candidates for the item repository plus
/// an account of every skipped row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub accepted: Vec<NewItem>,
    pub rejected: Vec<RejectedRow>,
}

/// Serialize the mirror to CSV. Returns None when there is nothing to
/// export; otherwise never fails in practice, the Result only carries
/// writer plumbing errors.
pub fn export(items: &[ScannedItem], fields: &[CustomField]) -> AppResult<Option<Export>> {
    if items.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = FIXED_HEADERS.to_vec();
    header.extend(fields.iter().map(|f| f.name.as_str()));
    writer.write_record(&header)?;

    for item in items {
        let mut record = vec![
            item.barcode.clone(),
            item.name.clone(),
            item.description.clone().unwrap_or_default(),
            item.category.clone(),
            item.scanned_at.format(TIMESTAMP_FORMAT).to_string(),
            item.updated_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        ];
        for f in fields {
            record.push(item.custom_fields.get(&f.name).cloned().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("failed to finish export: {e}")))?;
    let file_name = format!("barcode_inventory_{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok(Some(Export { file_name, bytes }))
}

/// Parse an uploaded file into item candidates. Columns map by exact
/// header name; missing columns read as blank and unknown columns are
/// ignored. Rows with an empty barcode or name are rejected with a
/// reason rather than dropped silently. Unparseable input (bad UTF-8,
/// ragged rows) fails outright so callers can tell a corrupt file from
/// one that merely had no valid rows.
pub fn import(bytes: &[u8], fields: &[CustomField]) -> AppResult<ImportReport> {
    let mut reader = csv::Reader::from_reader(bytes);

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let mut report = ImportReport::default();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        let cell = |name: &str| lookup(&columns, &record, name);

        let barcode = cell("Barcode");
        if barcode.is_empty() {
            report.rejected.push(RejectedRow {
                line,
                reason: RejectReason::EmptyBarcode,
            });
            continue;
        }
        let name = cell("Name");
        if name.is_empty() {
            report.rejected.push(RejectedRow {
                line,
                reason: RejectReason::EmptyName,
            });
            continue;
        }

        let description = Some(cell("Description").to_string()).filter(|d| !d.is_empty());
        let category = match cell("Category") {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };
        let scanned_at = parse_timestamp(cell("Scanned At")).unwrap_or_else(Utc::now);

        let custom_fields: HashMap<String, String> = fields
            .iter()
            .filter_map(|f| {
                let value = cell(&f.name);
                (!value.is_empty()).then(|| (f.name.clone(), value.to_string()))
            })
            .collect();

        report.accepted.push(NewItem {
            barcode: barcode.to_string(),
            name: name.to_string(),
            description,
            category,
            scanned_at,
            custom_fields,
        });
    }

    Ok(report)
}

/// Cell under the named column, trimmed; blank when the column or cell
/// is absent.
fn lookup<'r>(
    columns: &HashMap<String, usize>,
    record: &'r csv::StringRecord,
    name: &str,
) -> &'r str {
    columns
        .get(name)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("")
        .trim()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .ok()
}
