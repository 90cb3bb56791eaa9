use thiserror::Error;

/// Errors that can occur while rasterizing a document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document has no lines to render")]
    NoLines,

    #[error("glyph cell must be at least 1x1, got {width}x{height}")]
    InvalidMetrics { width: u32, height: u32 },

    #[error("canvas would be empty ({width}x{height})")]
    EmptyCanvas { width: u64, height: u64 },

    #[error("canvas {width}x{height} exceeds the {limit}px limit")]
    TooLarge { width: u64, height: u64, limit: u32 },

    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("png encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}
