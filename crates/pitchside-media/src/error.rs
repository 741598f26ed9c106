use thiserror::Error;

/// Errors returned by the storage and image-generation clients.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decoded bytes are neither JPEG nor PNG.
    #[error("generated data is not a JPEG or PNG image ({0} bytes)")]
    NotAnImage(usize),
}
