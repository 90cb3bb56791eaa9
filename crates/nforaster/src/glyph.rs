//! Glyph shapes and cell metrics.
//!
//! Shapes come from the public-domain 8x8 tables in `font8x8`, searched in
//! the order most info files need them. A shape is stretched into whatever
//! cell size is configured (8x16 gives the familiar VGA proportions).

use font8x8::{
    UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, MISC_FONTS,
};

/// Source bitmap side length.
const SOURCE_CELL: u32 = 8;

/// Fixed glyph cell size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
}

impl GlyphMetrics {
    pub const VGA: GlyphMetrics = GlyphMetrics { width: 8, height: 16 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel width of a line of `chars` glyphs.
    pub fn line_width(&self, chars: usize) -> u64 {
        chars as u64 * self.width as u64
    }
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self::VGA
    }
}

/// Look up the 8x8 shape for a character. Row bytes, bit 0 is the leftmost pixel.
pub fn shape(c: char) -> Option<[u8; 8]> {
    if c.is_control() {
        return None;
    }
    BASIC_FONTS
        .get(c)
        .or_else(|| BOX_FONTS.get(c))
        .or_else(|| BLOCK_FONTS.get(c))
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| MISC_FONTS.get(c))
}

/// Whether the cell pixel `(x, y)` is lit for `shape` stretched to `metrics`.
pub fn lit(shape: &[u8; 8], metrics: GlyphMetrics, x: u32, y: u32) -> bool {
    let sx = x * SOURCE_CELL / metrics.width;
    let sy = y * SOURCE_CELL / metrics.height;
    shape[sy as usize] & (1 << sx) != 0
}
