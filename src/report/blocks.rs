//! Chat block primitives and the pre-transmission validator.
//!
//! The block tree serializes to the incoming-webhook block-kit subset. The
//! validator is a pure function returning every violation it finds; the
//! transmitter refuses to send a payload with a non-empty violation list.

use serde::Serialize;

pub const MAX_BLOCKS: usize = 50;
pub const MAX_FIELDS: usize = 10;
pub const MAX_FIELD_TEXT: usize = 2000;
pub const MAX_SECTION_TEXT: usize = 3000;
pub const MAX_HEADER_TEXT: usize = 150;
pub const MAX_ALT_TEXT: usize = 2000;
pub const MAX_IMAGE_URL: usize = 3000;

/// A text object, `mrkdwn` or `plain_text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl Text {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn",
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: "plain_text",
            text: text.into(),
        }
    }
}

/// Reference to an already-uploaded chat file, by id or by URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackFileRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One message block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<Text>>,
    },
    Divider,
    Context {
        elements: Vec<Text>,
    },
    Image {
        #[serde(skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        slack_file: Option<SlackFileRef>,
        alt_text: String,
    },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: Text::plain(text),
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::Section {
            text: Some(Text::mrkdwn(text)),
            fields: None,
        }
    }

    pub fn fields(fields: Vec<String>) -> Self {
        Self::Section {
            text: None,
            fields: Some(fields.into_iter().map(Text::mrkdwn).collect()),
        }
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    pub fn context(text: impl Into<String>) -> Self {
        Self::Context {
            elements: vec![Text::mrkdwn(text)],
        }
    }

    pub fn image_url(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::Image {
            image_url: Some(url.into()),
            slack_file: None,
            alt_text: alt.into(),
        }
    }

    pub fn image_file(file: SlackFileRef, alt: impl Into<String>) -> Self {
        Self::Image {
            image_url: None,
            slack_file: Some(file),
            alt_text: alt.into(),
        }
    }
}

/// Check a block tree against the platform constraints. Returns every
/// violation found; an empty list means the payload is sendable. Odd field
/// counts render poorly in the two-column layout but are only warned about.
pub fn validate_blocks(blocks: &[Block]) -> Vec<String> {
    let mut violations = Vec::new();

    if blocks.len() > MAX_BLOCKS {
        violations.push(format!(
            "message has {} blocks, limit is {MAX_BLOCKS}",
            blocks.len()
        ));
    }

    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Header { text } => {
                if text.text.chars().count() > MAX_HEADER_TEXT {
                    violations.push(format!(
                        "block {i}: header text is {} chars, limit {MAX_HEADER_TEXT}",
                        text.text.chars().count()
                    ));
                }
            }
            Block::Section { text, fields } => {
                if let Some(text) = text {
                    if text.text.chars().count() > MAX_SECTION_TEXT {
                        violations.push(format!(
                            "block {i}: section text is {} chars, limit {MAX_SECTION_TEXT}",
                            text.text.chars().count()
                        ));
                    }
                }
                if let Some(fields) = fields {
                    if fields.is_empty() {
                        violations.push(format!("block {i}: fields must not be empty"));
                    }
                    if fields.len() > MAX_FIELDS {
                        violations.push(format!(
                            "block {i}: {} fields, limit {MAX_FIELDS}",
                            fields.len()
                        ));
                    }
                    if fields.len() % 2 != 0 {
                        log::warn!(
                            "block {i}: odd field count {} renders unevenly in two columns",
                            fields.len()
                        );
                    }
                    for (j, field) in fields.iter().enumerate() {
                        if field.text.chars().count() > MAX_FIELD_TEXT {
                            violations.push(format!(
                                "block {i} field {j}: {} chars, limit {MAX_FIELD_TEXT}",
                                field.text.chars().count()
                            ));
                        }
                    }
                }
            }
            Block::Image {
                image_url,
                slack_file,
                alt_text,
            } => {
                if alt_text.chars().count() > MAX_ALT_TEXT {
                    violations.push(format!(
                        "block {i}: alt_text is {} chars, limit {MAX_ALT_TEXT}",
                        alt_text.chars().count()
                    ));
                }
                match (image_url, slack_file) {
                    (Some(url), None) => {
                        if url.chars().count() > MAX_IMAGE_URL {
                            violations.push(format!(
                                "block {i}: image_url is {} chars, limit {MAX_IMAGE_URL}",
                                url.chars().count()
                            ));
                        }
                        if !url.starts_with("http://") && !url.starts_with("https://") {
                            violations
                                .push(format!("block {i}: image_url must match https?://"));
                        }
                    }
                    (None, Some(_)) => {}
                    (Some(_), Some(_)) => violations.push(format!(
                        "block {i}: image must carry image_url or slack_file, not both"
                    )),
                    (None, None) => violations.push(format!(
                        "block {i}: image carries neither image_url nor slack_file"
                    )),
                }
            }
            Block::Divider | Block::Context { .. } => {}
        }
    }

    violations
}
