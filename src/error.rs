use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("color count must be greater than 1, got {0}")]
    InvalidColorCount(usize),

    #[error("quality must be greater than 0, got {0}")]
    InvalidQuality(u32),
}

#[derive(Debug, Error)]
pub enum GifError {
    #[error("encoder has not been started")]
    NotStarted,

    #[error("writer has already been started")]
    AlreadyStarted,

    #[error("width {width} and height {height} must both be even")]
    OddDimension { width: u16, height: u16 },

    #[error("frame length {len} does not match {width}x{height} RGB frame")]
    FrameSizeMismatch {
        len: usize,
        width: u16,
        height: u16,
    },

    #[error("write failed")]
    Io(#[from] std::io::Error),
}
