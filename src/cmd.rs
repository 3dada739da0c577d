use crate::palette::PaintColor;

/// A state change requested through the control panel or a key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    Clear,

    ToggleMode,

    SetColor {
        color: PaintColor,
    },

    /// Sets the brush size. Out-of-range values are clamped.
    SetBrushSize {
        size: u32,
    },

    /// Grows or shrinks the brush by `delta`, clamped to the valid range.
    AdjustBrushSize {
        delta: i32,
    },
}

/// Whether fingertip motion paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Drawing,
    /// Fingertip is tracked but nothing is recorded.
    Navigation,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Drawing => Mode::Navigation,
            Mode::Navigation => Mode::Drawing,
        }
    }
}
