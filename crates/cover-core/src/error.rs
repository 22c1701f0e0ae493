use thiserror::Error;

/// Errors the engine surfaces to callers. None are retried internally; the
/// Eph5 "fit" strategy and Rang's retry-with-new-entropy policy both live at
/// the caller's layer, not here.
#[derive(Error)]
pub enum CoverError {
    #[error("color space is neither YCbCr nor grayscale")]
    InvalidColorSpace,

    #[error("JPEG block size is not 8x8")]
    InvalidBlockSize,

    #[error("image is too large: coefficient index would overflow")]
    TooBigImage,

    #[error("allocation failure")]
    AllocationFailure,

    #[error(transparent)]
    Codec(#[from] cover_codec::CodecError),

    #[error("embedding requested {requested} bytes but only {embedded} fit")]
    CapacityExceeded { requested: usize, embedded: usize },

    #[error("GF(2) linear system has no solution with the available padding bits")]
    MatrixSingular,
}

impl std::fmt::Debug for CoverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

pub type Result<T> = std::result::Result<T, CoverError>;
