//! The Tile record: one configured search parameter, as persisted and as
//! shown on a chip in the editor.

use serde::{Deserialize, Serialize};

use crate::fields::FieldId;

/// One configured parameter. `value` is the literal fragment appended to the
/// search URL, separator included; `raw_value` re-populates the form control
/// on reload. The serialized shape (camelCase) is the storage format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub key: String,
    pub label: String,
    pub value: String,
    pub raw_value: String,
    /// Display label of the chosen option, selector fields only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_label: Option<String>,
}

impl Tile {
    /// Build the tile for one form control, or `None` when the control is
    /// blank (blank fields contribute nothing and clear any previous tile
    /// for that key on the next apply).
    pub fn from_field(id: FieldId, raw: &str, select_label: Option<&str>) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            key: id.name().to_string(),
            label: id.label().to_string(),
            value: format!("&{}={}", id.name(), raw),
            raw_value: raw.to_string(),
            select_label: select_label.map(str::to_string),
        })
    }

    /// The catalog field this tile came from, if its key still matches one.
    pub fn field_id(&self) -> Option<FieldId> {
        FieldId::from_name(&self.key)
    }
}

/// One form control's value at apply time.
#[derive(Debug, Clone)]
pub struct FieldSnapshot {
    pub id: FieldId,
    pub raw: String,
    pub select_label: Option<String>,
}

/// Derive the full tile list from a form snapshot. The snapshot is walked in
/// the order given (callers pass catalog order), so key uniqueness and tile
/// ordering both fall out of the wholesale rebuild.
pub fn build_tiles<I>(snapshot: I) -> Vec<Tile>
where
    I: IntoIterator<Item = FieldSnapshot>,
{
    snapshot
        .into_iter()
        .filter_map(|f| Tile::from_field(f.id, &f.raw, f.select_label.as_deref()))
        .collect()
}
