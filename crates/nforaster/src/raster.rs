//! Canvas sizing, drawing and PNG output.
//!
//! Dimensions are always measured from the text first; the canvas is then
//! allocated once at that size and never cropped or grown.

use std::fmt;
use std::str::FromStr;

use crate::cp437;
use crate::error::RenderError;
use crate::glyph::{self, GlyphMetrics};

/// Largest canvas side we will allocate.
pub const MAX_DIMENSION: u32 = 32_768;

/// Largest total pixel count (about 200 MiB of RGB).
pub const MAX_PIXELS: u64 = 64 * 1024 * 1024;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([0xFF, 0xFF, 0xFF]);
    pub const BLACK: Rgb = Rgb([0x00, 0x00, 0x00]);
}

impl FromStr for Rgb {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "white" => return Ok(Rgb::WHITE),
            "black" => return Ok(Rgb::BLACK),
            _ => {}
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RenderError::InvalidColor(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| RenderError::InvalidColor(s.to_string()))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Everything the rasterizer needs besides the text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub metrics: GlyphMetrics,
    pub padding: u32,
    pub foreground: Rgb,
    pub background: Rgb,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            metrics: GlyphMetrics::VGA,
            padding: 20,
            foreground: Rgb::WHITE,
            background: Rgb::BLACK,
        }
    }
}

/// A rendered RGB image, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&color.0);
        }
        Self { width, height, pixels }
    }

    /// Colour of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]]))
    }

    fn set(&mut self, x: u32, y: u32, color: Rgb) {
        let at = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[at..at + 3].copy_from_slice(&color.0);
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Encode as an 8-bit RGB PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Compute canvas `(width, height)` for the given lines without drawing.
pub fn measure<L: AsRef<[u8]>>(
    lines: &[L],
    options: &RenderOptions,
) -> Result<(u32, u32), RenderError> {
    let GlyphMetrics { width: gw, height: gh } = options.metrics;
    if gw == 0 || gh == 0 {
        return Err(RenderError::InvalidMetrics { width: gw, height: gh });
    }
    if lines.is_empty() {
        return Err(RenderError::NoLines);
    }

    let widest = lines
        .iter()
        .map(|line| options.metrics.line_width(line.as_ref().len()))
        .max()
        .unwrap_or(0);

    let pad = options.padding as u64 * 2;
    let width = pad + widest;
    let height = pad + lines.len() as u64 * gh as u64;

    if width == 0 || height == 0 {
        return Err(RenderError::EmptyCanvas { width, height });
    }
    if width > MAX_DIMENSION as u64
        || height > MAX_DIMENSION as u64
        || width * height > MAX_PIXELS
    {
        return Err(RenderError::TooLarge {
            width,
            height,
            limit: MAX_DIMENSION,
        });
    }

    Ok((width as u32, height as u32))
}

/// Render CP437 lines onto a fresh canvas.
pub fn render<L: AsRef<[u8]>>(lines: &[L], options: &RenderOptions) -> Result<Bitmap, RenderError> {
    let (width, height) = measure(lines, options)?;
    let mut bitmap = Bitmap::filled(width, height, options.background);
    let metrics = options.metrics;

    for (row, line) in lines.iter().enumerate() {
        let top = options.padding + row as u32 * metrics.height;
        for (col, &byte) in line.as_ref().iter().enumerate() {
            let Some(shape) = glyph::shape(cp437::decode_byte(byte)) else {
                continue;
            };
            let left = options.padding + col as u32 * metrics.width;
            for y in 0..metrics.height {
                for x in 0..metrics.width {
                    if glyph::lit(&shape, metrics, x, y) {
                        bitmap.set(left + x, top + y, options.foreground);
                    }
                }
            }
        }
    }

    Ok(bitmap)
}

/// Split a raw document into lines and render it.
pub fn render_document(bytes: &[u8], options: &RenderOptions) -> Result<Bitmap, RenderError> {
    let lines = cp437::split_lines(bytes);
    render(&lines, options)
}
