//! Bibliography sources and their records
//!
//! The cache treats parsing as an external step behind [`SourceParser`].
//! [`BibtexParser`] is the implementation used by the binary.

mod parser;
mod record;

pub use parser::BibtexParser;
pub use record::Record;

use crate::error::Result;
use std::path::Path;

/// Turns a source file into formatted, newline-delimited text
pub trait SourceParser {
    /// Parse `path`, render each record with `formatter`, and pass every
    /// rendered line to `sink` as it is produced
    ///
    /// # Returns
    /// The full text that was streamed to `sink`, one record per line
    fn parse(
        &self,
        path: &Path,
        formatter: &dyn Fn(&Record) -> String,
        sink: &mut dyn FnMut(&str),
    ) -> Result<String>;
}

/// Render records into cache text, streaming each line to `sink`
///
/// Line breaks inside a rendered record are folded into spaces so that
/// reading the text back yields exactly the lines `sink` received.
pub fn render_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    formatter: &dyn Fn(&Record) -> String,
    sink: &mut dyn FnMut(&str),
) -> String {
    let mut data = String::new();
    for record in records {
        let rendered = formatter(record);
        let line = if rendered.contains(['\n', '\r']) {
            rendered.replace("\r\n", " ").replace(['\n', '\r'], " ")
        } else {
            rendered
        };
        sink(&line);
        data.push_str(&line);
        data.push('\n');
    }
    data
}
