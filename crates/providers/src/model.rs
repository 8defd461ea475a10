use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::stream::BoxStream;

/// Lazily produced, finite sequence of text fragments from a streaming call.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// One inline image sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64 (standard alphabet) image bytes
    pub data: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    pub image: Option<ImagePayload>,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// A generative model reachable over the network.
///
/// Errors carry an implementation-defined message; callers must not rely on
/// their structure.
#[async_trait]
pub trait RemoteModel: Send + Sync {
    /// Send a prompt and wait for the complete reply.
    async fn generate(&self, request: ModelRequest) -> Result<String>;

    /// Send a prompt and receive the reply as it is produced.
    ///
    /// Fails before returning if the connection cannot be established; errors
    /// after that surface as items of the stream.
    async fn generate_stream(&self, request: ModelRequest) -> Result<FragmentStream>;
}
