//! Response Views
//!
//! JSON envelopes returned for every command (`{"ok": true}` /
//! `{"ok": false, "error": ...}`) and the human-readable renderings of
//! timelines and store listings.

use crate::record::Timeline;
use crate::store::CompactReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::{Deserialize, Serialize};

/// Envelope shared by every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Base {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Response to a timeline read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(flatten)]
    pub base: Base,
    #[serde(rename = "timeline_content")]
    pub timeline: Timeline,
}

/// Response to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(flatten)]
    pub base: Base,
    pub entries: Vec<ListEntry>,
}

/// Response to a compaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactResponse {
    #[serde(flatten)]
    pub base: Base,
    #[serde(flatten)]
    pub report: CompactReport,
}

/// One stored record as seen by a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Dot count; absent for photos and for undecodable timelines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dots: Option<usize>,
    pub bytes: usize,
}

/// Render a store key: UTF-8 as is, anything else as `0x`-prefixed hex.
pub fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => s.to_string(),
        Err(_) => format!("0x{}", hex::encode(key)),
    }
}

/// Serialize a response envelope. Serialization of these types cannot fail
/// in practice, but a failure still yields a valid error envelope.
pub fn to_json<T: Serialize>(response: &T) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        format!(
            "{{\"ok\":false,\"error\":{}}}",
            serde_json::Value::String(e.to_string())
        )
    })
}

pub fn ok_json() -> String {
    to_json(&Base::ok())
}

pub fn error_json(message: &str) -> String {
    to_json(&Base::error(message))
}

/// Human-readable timeline: header line then one row per dot.
pub fn format_timeline_text(id: &str, timeline: &Timeline) -> String {
    let mut out = String::new();
    match &timeline.alias {
        Some(alias) => out.push_str(&format!("Timeline {} ({})\n", id, alias)),
        None => out.push_str(&format!("Timeline {}\n", id)),
    }
    if timeline.dots.is_empty() {
        out.push_str("  No dots\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Dot", "Title", "When", "Size", "Photo", "Description"]);
    for (dot_id, dot) in &timeline.dots {
        let when = dot
            .timestamp()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| dot.epoch.to_string());
        table.add_row(vec![
            dot_id.clone(),
            dot.title.clone(),
            when,
            dot.size.to_string(),
            dot.photo_id.clone().unwrap_or_else(|| "-".to_string()),
            dot.description.clone().unwrap_or_default(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Human-readable listing of timelines or photos.
pub fn format_list_text(entries: &[ListEntry], photos: bool) -> String {
    if entries.is_empty() {
        return if photos {
            "No photos stored\n".to_string()
        } else {
            "No timelines stored\n".to_string()
        };
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if photos {
        table.set_header(vec!["Photo", "Bytes"]);
        for entry in entries {
            table.add_row(vec![entry.id.clone(), entry.bytes.to_string()]);
        }
    } else {
        table.set_header(vec!["Timeline", "Alias", "Dots", "Bytes"]);
        for entry in entries {
            table.add_row(vec![
                entry.id.clone(),
                entry.alias.clone().unwrap_or_else(|| "-".to_string()),
                entry
                    .dots
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                entry.bytes.to_string(),
            ]);
        }
    }
    format!("{}\n", table)
}
