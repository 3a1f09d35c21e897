//! Glyph shaping capability seam.
//!
//! Shaping internals are outside this engine: a [`Shaper`] turns a string
//! plus a font description into a run of positioned glyphs, and the engine
//! treats the result as opaque geometry. Hosts plug in a real text stack;
//! [`FixedAdvanceShaper`] covers tests and headless use.

use bitflags::bitflags;

use crate::widgets::Point;

bitflags! {
    /// Font style flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct FontStyle: u8 {
        const BOLD   = 0b01;
        const ITALIC = 0b10;
    }
}

/// Font description passed opaquely to the shaping capability.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    /// Family name
    pub family: String,
    /// Size in logical points
    pub size: f32,
    /// Style flags
    pub style: FontStyle,
}

impl FontDescription {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            style: FontStyle::empty(),
        }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }
}

/// One shaped glyph, positioned relative to the run origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Glyph id in the shaper's font
    pub id: u32,
    /// Offset from the run origin (baseline-relative), logical units
    pub offset: Point,
    /// Horizontal advance in logical units
    pub advance: f32,
}

/// A shaped run of glyphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphRun {
    pub glyphs: Vec<Glyph>,
    /// Nominal line size (font size) in logical units
    pub size: f32,
}

impl GlyphRun {
    /// Total advance width of the run.
    pub fn width(&self) -> f32 {
        self.glyphs.iter().map(|g| g.advance).sum()
    }
}

/// Opaque glyph-layout capability: `shape(text, font) -> glyph run`.
pub trait Shaper {
    fn shape(&self, text: &str, font: &FontDescription) -> GlyphRun;
}

/// Trivial shaper assigning every character a fixed fraction of the font
/// size. Good enough for layout-level tests and hosts without a text stack.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceShaper {
    /// Advance per character as a fraction of the font size
    pub advance_ratio: f32,
}

impl Default for FixedAdvanceShaper {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl Shaper for FixedAdvanceShaper {
    fn shape(&self, text: &str, font: &FontDescription) -> GlyphRun {
        let advance = font.size * self.advance_ratio;
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph {
                id: c as u32,
                offset: Point::new(i as f32 * advance, 0.0),
                advance,
            })
            .collect();

        GlyphRun {
            glyphs,
            size: font.size,
        }
    }
}
