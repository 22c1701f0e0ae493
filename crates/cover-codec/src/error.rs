use thiserror::Error;

/// Errors raised while parsing, decoding, or re-encoding a JPEG file.
#[derive(Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JPEG: {reason}")]
    Malformed { reason: String },

    #[error("progressive JPEGs are not supported for coefficient access")]
    ProgressiveUnsupported,
}

impl std::fmt::Debug for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        CodecError::Malformed {
            reason: reason.into(),
        }
    }
}
