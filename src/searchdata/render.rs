//! Writer for generated `searchData` script payloads.
//!
//! Output follows the generated layout exactly: one record per line, indented
//! by two spaces, single-quoted strings and the flag written as `1` or `0`.
//! Rendering the records parsed from a generated file reproduces it byte for byte.

use crate::types::IndexRecord;
use std::fmt::{self, Write};

/// Renders records as a complete `var searchData=` script.
pub fn render_search_data<'a>(records: impl IntoIterator<Item = &'a IndexRecord>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_search_data(records, &mut out);
    out
}

/// Writes records as a complete `var searchData=` script.
pub fn write_search_data<'a, W: Write>(
    records: impl IntoIterator<Item = &'a IndexRecord>,
    out: &mut W,
) -> fmt::Result {
    out.write_str("var searchData=\n[\n")?;
    for (idx, record) in records.into_iter().enumerate() {
        if idx > 0 {
            out.write_str(",\n")?;
        }
        out.write_str("  ")?;
        write_record(record, out)?;
    }
    out.write_str("\n];\n")
}

fn write_record<W: Write>(record: &IndexRecord, out: &mut W) -> fmt::Result {
    out.write_char('[')?;
    write_quoted(&record.search_key, out)?;
    out.write_str(",[")?;
    write_quoted(record.label(), out)?;
    for entry in &record.entries {
        out.write_str(",[")?;
        write_quoted(&entry.target_link, out)?;
        out.write_str(if entry.target_parent { ",1," } else { ",0," })?;
        write_quoted(&entry.scope_label, out)?;
        out.write_char(']')?;
    }
    out.write_str("]]")
}

fn write_quoted<W: Write>(value: &str, out: &mut W) -> fmt::Result {
    out.write_char('\'')?;
    for c in value.chars() {
        match c {
            '\'' => out.write_str("\\'")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('\'')
}
