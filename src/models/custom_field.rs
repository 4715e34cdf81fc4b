use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input kind for a user-defined field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    /// Multi-line text; stored as "textarea" for compatibility with the
    /// web client's field configuration.
    #[serde(rename = "textarea")]
    Multiline,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Multiline => "textarea",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(FieldKind::Text),
            "textarea" => Some(FieldKind::Multiline),
            _ => None,
        }
    }
}

/// A user-defined field definition. `name` doubles as the display label
/// and the spreadsheet column / custom-value key, so it is unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: Uuid,
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// A field definition before persistence assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}
