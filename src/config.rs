use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use serde::{de::Visitor, Deserialize};

use crate::{cmd::Cmd, palette::PaintColor, session::BRUSH_SIZES};

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Delay between two pipeline ticks, in milliseconds.
    pub tick_ms: u64,
    pub camera: Camera,
    pub detector: Detector,
    pub gesture: Gesture,
    pub canvas: Canvas,
    pub bind: HashMap<Key, CommandVerb>,
}

impl Config {
    pub fn load<A: AsRef<Path>>(path: A) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file `{}`", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file `{}`", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick_ms == 0 {
            bail!("`tick_ms` must be at least 1");
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            bail!(
                "camera resolution must be non-zero (got {}x{})",
                self.camera.width,
                self.camera.height
            );
        }
        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            bail!(
                "`detector.min_confidence` must be between 0 and 1 (got {})",
                self.detector.min_confidence
            );
        }
        if self.detector.input_size == 0 {
            bail!("`detector.input_size` must be non-zero");
        }
        if self.gesture.pinch_threshold < 0.0 {
            bail!(
                "`gesture.pinch_threshold` must not be negative (got {})",
                self.gesture.pinch_threshold
            );
        }
        if self.canvas.max_stroke_len < 2 {
            bail!(
                "`canvas.max_stroke_len` must be at least 2 (got {})",
                self.canvas.max_stroke_len
            );
        }
        if !BRUSH_SIZES.contains(&self.canvas.brush_size) {
            bail!(
                "`canvas.brush_size` must be within {}..={} (got {})",
                BRUSH_SIZES.start(),
                BRUSH_SIZES.end(),
                self.canvas.brush_size
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let bind = [
            ('c', CommandVerb::Clear),
            ('m', CommandVerb::ToggleMode),
            ('1', CommandVerb::ColorBlack),
            ('2', CommandVerb::ColorBlue),
            ('3', CommandVerb::ColorGreen),
            ('4', CommandVerb::ColorRed),
            ('5', CommandVerb::ColorYellow),
            ('+', CommandVerb::BrushUp),
            ('-', CommandVerb::BrushDown),
        ]
        .into_iter()
        .map(|(c, verb)| (Key(c), verb))
        .collect();

        Self {
            tick_ms: 10,
            camera: Camera::default(),
            detector: Detector::default(),
            gesture: Gesture::default(),
            canvas: Canvas::default(),
            bind,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Camera {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Flip frames horizontally so the feed behaves like a mirror.
    pub mirror: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            mirror: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Detector {
    /// Path to the hand landmark ONNX model.
    pub model: String,
    /// Minimum hand presence score for a detection to count.
    pub min_confidence: f32,
    /// Side length of the square model input, in pixels.
    pub input_size: u32,
    pub layout: TensorLayout,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            model: "models/hand_landmark.onnx".into(),
            min_confidence: 0.7,
            input_size: 224,
            layout: TensorLayout::Nhwc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Gesture {
    /// Thumb-to-index distance (in frame pixels) below which the hand counts as pinching.
    pub pinch_threshold: f32,
    /// Height of the strip at the top of the frame where the fingertip is ignored.
    pub ui_band_height: i32,
    /// Insert a gap into the active stroke when the hand leaves the frame.
    pub lift_on_hand_lost: bool,
}

impl Default for Gesture {
    fn default() -> Self {
        Self {
            pinch_threshold: 30.0,
            ui_band_height: 65,
            lift_on_hand_lost: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Canvas {
    pub max_stroke_len: usize,
    pub brush_size: u32,
    pub color: PaintColor,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            max_stroke_len: 1024,
            brush_size: 5,
            color: PaintColor::Black,
        }
    }
}

/// A keyboard key, identified by the character it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub(crate) char);

impl Key {
    /// Keys are matched case-insensitively.
    pub fn from_char(c: char) -> Self {
        Key(c.to_ascii_lowercase())
    }
}

impl<'a> Deserialize<'a> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct CharVisitor;

        impl<'de> Visitor<'de> for CharVisitor {
            type Value = Key;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a single character")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::from_char(c)),
                    _ => Err(E::custom(format_args!(
                        "invalid key '{v}', expected a single character"
                    ))),
                }
            }
        }

        deserializer.deserialize_str(CharVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandVerb {
    #[serde(rename = "CLEAR")]
    Clear,
    #[serde(rename = "TOGGLE_MODE")]
    ToggleMode,
    #[serde(rename = "COLOR_BLACK")]
    ColorBlack,
    #[serde(rename = "COLOR_BLUE")]
    ColorBlue,
    #[serde(rename = "COLOR_GREEN")]
    ColorGreen,
    #[serde(rename = "COLOR_RED")]
    ColorRed,
    #[serde(rename = "COLOR_YELLOW")]
    ColorYellow,
    #[serde(rename = "BRUSH_UP")]
    BrushUp,
    #[serde(rename = "BRUSH_DOWN")]
    BrushDown,
}

impl CommandVerb {
    pub fn cmd(self) -> Cmd {
        match self {
            CommandVerb::Clear => Cmd::Clear,
            CommandVerb::ToggleMode => Cmd::ToggleMode,
            CommandVerb::ColorBlack => Cmd::SetColor {
                color: PaintColor::Black,
            },
            CommandVerb::ColorBlue => Cmd::SetColor {
                color: PaintColor::Blue,
            },
            CommandVerb::ColorGreen => Cmd::SetColor {
                color: PaintColor::Green,
            },
            CommandVerb::ColorRed => Cmd::SetColor {
                color: PaintColor::Red,
            },
            CommandVerb::ColorYellow => Cmd::SetColor {
                color: PaintColor::Yellow,
            },
            CommandVerb::BrushUp => Cmd::AdjustBrushSize { delta: 1 },
            CommandVerb::BrushDown => Cmd::AdjustBrushSize { delta: -1 },
        }
    }
}
