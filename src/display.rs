//! Readout formatting for the six-glyph segment display
//!
//! The display itself is an external collaborator reached through [`Display`].
//! This module only fixes how values are turned into glyphs:
//!
//! - text and integers are cut to [`DISPLAY_WIDTH`] glyphs
//! - floats keep exactly one truncated fractional digit (`-85.0`, `2.3`)
//! - percentages are `value * 100` as an integer followed by `°/%`

use core::fmt::Write;

/// Number of glyph positions on the display
pub const DISPLAY_WIDTH: usize = 6;

/// Rendered readout, at most [`DISPLAY_WIDTH`] glyphs
pub type Glyphs = heapless::String<24>;

/// Sink for rendered readouts
pub trait Display {
    /// Clears the display and shows `text` left aligned.
    fn show(&mut self, text: &str);
}

/// A value to put on the display
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Readout {
    Text(&'static str),
    Int(i32),
    Float(f32),
    Percentage(f32),
}

impl Readout {
    /// Renders the readout into display glyphs.
    pub fn render(&self) -> Glyphs {
        let mut full = heapless::String::<32>::new();

        // 32 bytes hold any i32 plus the suffixes below
        let _ = match *self {
            Self::Text(text) => return fit(text),
            Self::Int(value) => write!(full, "{}", value),
            Self::Float(value) => {
                let tenths = (value * 10.0) as i32;
                let sign = if value < 0.0 && tenths != 0 { "-" } else { "" };
                let magnitude = tenths.unsigned_abs();
                write!(full, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
            }
            Self::Percentage(value) => write!(full, "{}°/%", (value * 100.0) as i32),
        };

        fit(&full)
    }
}

fn fit(text: &str) -> Glyphs {
    let mut glyphs = Glyphs::new();
    for glyph in text.chars().take(DISPLAY_WIDTH) {
        // DISPLAY_WIDTH glyphs of at most four bytes each
        let _ = glyphs.push(glyph);
    }
    glyphs
}
