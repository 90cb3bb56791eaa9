//! Fixed-cell text rasterizer for release info files.
//!
//! Info files are CP437 text drawn with box-drawing and shading characters.
//! This crate turns one into a PNG using a single constant glyph cell, so
//! the output looks the way it would on a VGA text console.
//!
//! ```rust
//! use nforaster::{render_document, RenderOptions};
//!
//! let raw = b"\xC9\xCD\xBB\r\n\xC8\xCD\xBC\r\n";
//! let bitmap = render_document(raw, &RenderOptions::default()).unwrap();
//! assert_eq!(bitmap.height, 20 * 2 + 2 * 16);
//! let png = bitmap.to_png().unwrap();
//! assert!(!png.is_empty());
//! ```

pub mod cp437;
pub mod error;
pub mod glyph;
pub mod raster;

pub use error::RenderError;
pub use glyph::GlyphMetrics;
pub use raster::{measure, render, render_document, Bitmap, RenderOptions, Rgb};
