use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::core::blocks::Record;

/// Pretty-printed JSON of the full transaction, indented with `indent` spaces.
/// No selection renders as an empty string.
pub fn render_record(record: Option<&Record>, indent: usize) -> String {
    let Some(record) = record else {
        return String::new();
    };

    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    match record.raw().serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(e) => format!("<unprintable transaction: {e}>"),
    }
}
