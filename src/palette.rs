use std::fmt;

use serde::Deserialize;

/// One of the fixed paint colors. Each color owns its own bucket of strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintColor {
    Blue,
    Green,
    Red,
    Yellow,
    Black,
}

impl PaintColor {
    /// Bucket order. Strokes are rendered in this order, so later colors paint over earlier ones.
    pub const ALL: [PaintColor; 5] = [
        PaintColor::Blue,
        PaintColor::Green,
        PaintColor::Red,
        PaintColor::Yellow,
        PaintColor::Black,
    ];

    /// Order of the swatches in the control panel.
    pub const SWATCHES: [PaintColor; 5] = [
        PaintColor::Black,
        PaintColor::Blue,
        PaintColor::Green,
        PaintColor::Red,
        PaintColor::Yellow,
    ];

    pub fn rgb(self) -> [u8; 3] {
        match self {
            PaintColor::Blue => [0, 0, 255],
            PaintColor::Green => [0, 255, 0],
            PaintColor::Red => [255, 0, 0],
            PaintColor::Yellow => [255, 255, 0],
            PaintColor::Black => [0, 0, 0],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaintColor::Blue => "blue",
            PaintColor::Green => "green",
            PaintColor::Red => "red",
            PaintColor::Yellow => "yellow",
            PaintColor::Black => "black",
        }
    }

    /// Capitalized name, for buttons.
    pub fn label(self) -> &'static str {
        match self {
            PaintColor::Blue => "Blue",
            PaintColor::Green => "Green",
            PaintColor::Red => "Red",
            PaintColor::Yellow => "Yellow",
            PaintColor::Black => "Black",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PaintColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
