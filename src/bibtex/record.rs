//! A single bibliography entry

use serde::Serialize;
use std::collections::BTreeMap;

/// Field name holding the entry type (`article`, `book`, ...)
pub const TYPE_FIELD: &str = "type";

/// Field name holding the citation key
pub const KEY_FIELD: &str = "key";

/// Field-name to value mapping for one entry
///
/// The entry type and citation key are stored alongside the regular
/// fields under `type` and `key`. Field names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(entry_type: &str, key: &str) -> Self {
        let mut record = Self::default();
        record.insert(TYPE_FIELD, entry_type);
        record.insert(KEY_FIELD, key);
        record
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: &str, value: &str) {
        self.fields
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn key(&self) -> &str {
        self.get(KEY_FIELD).unwrap_or_default()
    }

    pub fn entry_type(&self) -> &str {
        self.get(TYPE_FIELD).unwrap_or_default()
    }
}
