//! Contracts with whatever shapes and rasterizes text.
//!
//! Layout only needs widths ([`TextMeasure`]); the compositor needs per-glyph
//! placement and atlas coordinates ([`FontMetrics`]). Both must return the same
//! answer for the same input within a frame.

use strata_core::{Size, Vec2};

pub trait TextMeasure {
    fn measure(&self, text: &str, scale: f32) -> Size;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f32) -> Size,
{
    fn measure(&self, text: &str, scale: f32) -> Size {
        self(text, scale)
    }
}

/// Placement of one glyph relative to the pen position on the baseline-top
/// line, plus its atlas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphInfo {
    pub advance: f32,
    pub offset: Vec2,
    pub size: Size,
    pub uv0: Vec2,
    pub uv1: Vec2,
}

pub trait FontMetrics {
    fn line_height(&self, scale: f32) -> f32;

    /// `None` for glyphs with nothing to draw and no advance.
    fn glyph(&self, ch: char, scale: f32) -> Option<GlyphInfo>;

    /// Pen advance of a whole string.
    fn advance(&self, text: &str, scale: f32) -> f32 {
        text.chars()
            .filter_map(|c| self.glyph(c, scale))
            .map(|g| g.advance)
            .sum()
    }
}

/// Fixed-advance measurer for tests and headless hosts.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
    pub advance: f32,
    pub line_height: f32,
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, scale: f32) -> Size {
        Size {
            width: text.chars().count() as f32 * self.advance * scale,
            height: self.line_height * scale,
        }
    }
}

impl FontMetrics for MonospaceMeasure {
    fn line_height(&self, scale: f32) -> f32 {
        self.line_height * scale
    }

    fn glyph(&self, ch: char, scale: f32) -> Option<GlyphInfo> {
        let advance = self.advance * scale;
        let size = if ch.is_whitespace() {
            Size::default()
        } else {
            Size {
                width: advance,
                height: self.line_height * scale,
            }
        };
        Some(GlyphInfo {
            advance,
            offset: Vec2::ZERO,
            size,
            uv0: Vec2::ZERO,
            uv1: Vec2::new(1.0, 1.0),
        })
    }
}
