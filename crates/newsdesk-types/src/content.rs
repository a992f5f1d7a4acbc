use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in an article's ordered content array.
///
/// Known shapes deserialize into typed variants; anything else round-trips
/// through `Unknown` untouched so new block types added by the frontend
/// survive a create/update cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Typed(TypedBlock),
    Unknown(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypedBlock {
    Paragraph {
        #[serde(default)]
        value: String,
    },
    Image {
        #[serde(default)]
        value: String,
        #[serde(default)]
        caption: String,
    },
}

impl ContentBlock {
    pub fn paragraph(value: impl Into<String>) -> Self {
        Self::Typed(TypedBlock::Paragraph {
            value: value.into(),
        })
    }

    pub fn image(value: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::Typed(TypedBlock::Image {
            value: value.into(),
            caption: caption.into(),
        })
    }
}

/// Multipart image blocks reference their file part as `file_<index>`.
pub fn is_file_placeholder(value: &str) -> bool {
    value.starts_with("file_")
}
