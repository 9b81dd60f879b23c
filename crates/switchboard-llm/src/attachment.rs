use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use switchboard_types::{Result, SwitchboardError};

use crate::Provider;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// UploadedFile
// ---------------------------------------------------------------------------

/// A file handed to the formatter: a name, an optional MIME type and bytes
/// that are read once.
#[async_trait]
pub trait UploadedFile: Send {
    fn filename(&self) -> &str;
    fn content_type(&self) -> Option<&str>;
    async fn read(&mut self) -> Result<Vec<u8>>;
}

/// An upload whose bytes are already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[async_trait]
impl UploadedFile for InMemoryFile {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn read(&mut self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.bytes))
    }
}

/// A file on disk. The MIME type is guessed from the extension.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    filename: String,
    content_type: Option<String>,
}

impl LocalFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            path,
            filename,
            content_type,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadedFile for LocalFile {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn read(&mut self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

// ---------------------------------------------------------------------------
// AttachmentFragment
// ---------------------------------------------------------------------------

/// Provider-specific message content embedding a base64 file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttachmentFragment {
    /// Flat Responses API part.
    InputFile { filename: String, file_data: String },
    /// The same part wrapped in a `file` object.
    File { file: InputFile },
    /// Raw MIME type and base64 data.
    Media { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: String,
    pub file_data: String,
}

impl AttachmentFragment {
    /// `(filename, data URL)` for the file-style variants.
    pub fn file_parts(&self) -> Option<(&str, &str)> {
        match self {
            AttachmentFragment::InputFile {
                filename,
                file_data,
            } => Some((filename.as_str(), file_data.as_str())),
            AttachmentFragment::File { file } => Some((file.filename.as_str(), file.file_data.as_str())),
            AttachmentFragment::Media { .. } => None,
        }
    }

    /// `(mime type, base64 payload)` regardless of variant.
    pub fn inline_data(&self) -> Option<(&str, &str)> {
        match self {
            AttachmentFragment::Media { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            _ => {
                let (_, url) = self.file_parts()?;
                let rest = url.strip_prefix("data:")?;
                rest.split_once(";base64,")
            }
        }
    }
}

fn data_url(content_type: &str, b64: &str) -> String {
    format!("data:{content_type};base64,{b64}")
}

enum FragmentShape {
    Flat,
    Nested,
    Media,
}

fn fragment_shape(provider: Provider) -> Result<FragmentShape> {
    match provider {
        Provider::OpenAi => Ok(FragmentShape::Flat),
        Provider::Azure | Provider::MistralAi => Ok(FragmentShape::Nested),
        Provider::Google => Ok(FragmentShape::Media),
        Provider::Groq => Err(SwitchboardError::UnsupportedOperation {
            provider: provider.display_name().to_string(),
            operation: "File upload".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// file_to_message
// ---------------------------------------------------------------------------

/// Convert an upload into the message fragment `provider` expects.
///
/// `provider` may be a [`Provider`] or a raw tag. Unknown tags fail with
/// `InvalidSpecification`; providers without attachment support fail with
/// `UnsupportedOperation` before the file is read.
pub async fn file_to_message<F>(file: &mut F, provider: impl AsRef<str>) -> Result<AttachmentFragment>
where
    F: UploadedFile + ?Sized,
{
    let tag = provider.as_ref();
    let provider: Provider = tag.parse().map_err(|_| {
        SwitchboardError::invalid(format!("Unsupported model provider: {tag}"))
    })?;

    let shape = fragment_shape(provider)?;

    let content = file.read().await?;
    let content_b64 = base64::engine::general_purpose::STANDARD.encode(&content);
    let content_type = file.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
    let filename = file.filename().to_string();

    tracing::debug!(
        provider = %provider,
        filename = %filename,
        content_type = %content_type,
        bytes = content.len(),
        "Formatting attachment"
    );

    let fragment = match shape {
        FragmentShape::Flat => AttachmentFragment::InputFile {
            filename,
            file_data: data_url(&content_type, &content_b64),
        },
        FragmentShape::Nested => AttachmentFragment::File {
            file: InputFile {
                kind: "input_file".to_string(),
                filename,
                file_data: data_url(&content_type, &content_b64),
            },
        },
        FragmentShape::Media => AttachmentFragment::Media {
            mime_type: content_type,
            data: content_b64,
        },
    };

    Ok(fragment)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
