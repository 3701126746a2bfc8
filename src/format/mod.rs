//! Record formatters
//!
//! Each [`RecordFormat`] maps a record to the single line stored in the
//! cache and shown to the user.

use crate::bibtex::Record;
use crate::config::RecordFormat;

/// Formatting function for the given format
pub fn formatter_for(format: RecordFormat) -> fn(&Record) -> String {
    match format {
        RecordFormat::Default => format_default,
        RecordFormat::Json => format_json,
        RecordFormat::Key => format_key,
    }
}

/// `Author (Year) Title`, omitting absent parts
pub fn format_default(record: &Record) -> String {
    let mut parts = Vec::new();
    if let Some(author) = record.get("author").or_else(|| record.get("editor")) {
        parts.push(author.to_string());
    }
    if let Some(year) = record.get("year") {
        parts.push(format!("({})", year));
    }
    if let Some(title) = record.get("title") {
        parts.push(title.to_string());
    }
    if parts.is_empty() {
        return format!("{} [{}]", record.key(), record.entry_type());
    }
    parts.join(" ")
}

/// The whole record as a single-line JSON object
pub fn format_json(record: &Record) -> String {
    // A string map always serializes
    serde_json::to_string(record).unwrap_or_default()
}

pub fn format_key(record: &Record) -> String {
    record.key().to_string()
}
