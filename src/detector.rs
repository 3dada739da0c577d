//! Hand landmark detection.
//!
//! The detector runs a MediaPipe-style hand landmark model through ONNX Runtime. The model is
//! fed the whole frame, scaled to its square input, and is expected to produce 21 `(x, y, z)`
//! landmarks in input pixel coordinates plus a scalar hand presence score.

use std::path::Path;

use anyhow::{anyhow, bail};
use image::RgbaImage;
use ndarray::Array4;
use ort::{session::Session, value::Tensor};

use crate::{
    config::{self, TensorLayout},
    gesture::{HandLandmarks, LANDMARK_COUNT},
    math::vec2,
};

pub trait LandmarkDetector {
    /// Returns the landmarks of the hand in `frame`, in frame pixel coordinates, or `None` if
    /// there is no hand.
    fn detect(&mut self, frame: &RgbaImage) -> anyhow::Result<Option<HandLandmarks>>;
}

/// Used when no model is available. Never sees a hand.
pub struct NullDetector;

impl LandmarkDetector for NullDetector {
    fn detect(&mut self, _frame: &RgbaImage) -> anyhow::Result<Option<HandLandmarks>> {
        Ok(None)
    }
}

/// Loads the configured model, falling back to [`NullDetector`] if that fails.
pub fn from_config(config: &config::Detector) -> Box<dyn LandmarkDetector> {
    match OnnxHandDetector::load(config) {
        Ok(detector) => Box::new(detector),
        Err(e) => {
            log::warn!("hand tracking disabled: {e:#}");
            Box::new(NullDetector)
        }
    }
}

pub struct OnnxHandDetector {
    session: Session,
    input_size: u32,
    layout: TensorLayout,
    min_confidence: f32,
}

impl OnnxHandDetector {
    pub fn load(config: &config::Detector) -> anyhow::Result<Self> {
        let path = Path::new(&config.model);
        if !path.exists() {
            bail!("hand landmark model not found at `{}`", path.display());
        }

        let session = Session::builder()
            .map_err(|e| anyhow!("failed to create session builder: {e}"))?
            .with_intra_threads(2)
            .map_err(|e| anyhow!("failed to set thread count: {e}"))?
            .commit_from_file(path)
            .map_err(|e| anyhow!("failed to load `{}`: {e}", path.display()))?;

        log::info!(
            "loaded hand landmark model from `{}` ({}x{} {:?})",
            path.display(),
            config.input_size,
            config.input_size,
            config.layout,
        );

        Ok(Self {
            session,
            input_size: config.input_size,
            layout: config.layout,
            min_confidence: config.min_confidence,
        })
    }
}

impl LandmarkDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &RgbaImage) -> anyhow::Result<Option<HandLandmarks>> {
        let input = Tensor::from_array(preprocess(frame, self.input_size, self.layout))
            .map_err(|e| anyhow!("failed to create input tensor: {e}"))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| anyhow!("inference failed: {e}"))?;

        let mut tensors = Vec::new();
        for (name, value) in outputs.iter() {
            let (_shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| anyhow!("failed to read model output `{name}`: {e}"))?;
            tensors.push((name.to_string(), data.to_vec()));
        }

        Ok(decode(
            &tensors,
            self.input_size,
            frame.dimensions(),
            self.min_confidence,
        ))
    }
}

/// Scales `frame` to a `size`x`size` RGB tensor with values in 0-1 (nearest neighbour).
fn preprocess(frame: &RgbaImage, size: u32, layout: TensorLayout) -> Array4<f32> {
    let side = size as usize;
    let mut input = match layout {
        TensorLayout::Nhwc => Array4::zeros((1, side, side, 3)),
        TensorLayout::Nchw => Array4::zeros((1, 3, side, side)),
    };
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return input;
    }

    let x_ratio = width as f32 / size as f32;
    let y_ratio = height as f32 / size as f32;
    for y in 0..side {
        for x in 0..side {
            let src_x = ((x as f32 * x_ratio) as u32).min(width - 1);
            let src_y = ((y as f32 * y_ratio) as u32).min(height - 1);
            let px = frame.get_pixel(src_x, src_y);
            for c in 0..3 {
                let value = px.0[c] as f32 / 255.0;
                match layout {
                    TensorLayout::Nhwc => input[[0, y, x, c]] = value,
                    TensorLayout::Nchw => input[[0, c, y, x]] = value,
                }
            }
        }
    }
    input
}

/// Turns raw model outputs into landmarks in frame coordinates.
///
/// The landmark tensor is the first output holding at least 21 `(x, y, z)` triples. The
/// presence score is the first scalar output whose name mentions a score, falling back to the
/// first scalar output. Models without a scalar output are trusted unconditionally.
fn decode(
    outputs: &[(String, Vec<f32>)],
    input_size: u32,
    (frame_width, frame_height): (u32, u32),
    min_confidence: f32,
) -> Option<HandLandmarks> {
    let (_, landmarks) = outputs
        .iter()
        .find(|(_, data)| data.len() >= LANDMARK_COUNT * 3 && data.len() % 3 == 0)?;

    let is_score = |name: &str| {
        let name = name.to_ascii_lowercase();
        ["score", "presence", "flag"]
            .iter()
            .any(|hint| name.contains(hint))
    };
    let scalars = || outputs.iter().filter(|(_, data)| data.len() == 1);
    let score = scalars()
        .find(|(name, _)| is_score(name.as_str()))
        .or_else(|| scalars().next())
        .map(|(_, data)| presence(data[0]));

    if let Some(score) = score {
        if score < min_confidence {
            log::trace!("hand presence {score:.2} below threshold");
            return None;
        }
    }

    let sx = frame_width as f32 / input_size as f32;
    let sy = frame_height as f32 / input_size as f32;
    Some(HandLandmarks::new(std::array::from_fn(|i| {
        vec2(landmarks[i * 3] * sx, landmarks[i * 3 + 1] * sy)
    })))
}

/// Some exports emit raw logits for the presence score.
fn presence(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::gesture::{INDEX_FINGER_TIP, THUMB_TIP};

    fn raw_landmarks() -> Vec<f32> {
        (0..LANDMARK_COUNT)
            .flat_map(|i| [i as f32 * 10.0, i as f32 * 5.0, 0.0])
            .collect()
    }

    #[test]
    fn null_detector_sees_nothing() {
        let frame = RgbaImage::new(4, 4);
        assert!(NullDetector.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn missing_model_is_an_error() {
        let config = config::Detector {
            model: "does/not/exist.onnx".into(),
            ..Default::default()
        };
        assert!(OnnxHandDetector::load(&config).is_err());
    }

    #[test]
    fn preprocess_layouts() {
        let mut frame = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        frame.put_pixel(2, 1, Rgba([255, 51, 0, 255]));

        let nhwc = preprocess(&frame, 2, TensorLayout::Nhwc);
        assert_eq!(nhwc.shape(), [1, 2, 2, 3]);
        assert_eq!(nhwc[[0, 1, 1, 0]], 1.0);
        assert_eq!(nhwc[[0, 1, 1, 1]], 0.2);
        assert_eq!(nhwc[[0, 0, 0, 0]], 0.0);

        let nchw = preprocess(&frame, 2, TensorLayout::Nchw);
        assert_eq!(nchw.shape(), [1, 3, 2, 2]);
        assert_eq!(nchw[[0, 0, 1, 1]], 1.0);
        assert_eq!(nchw[[0, 1, 1, 1]], 0.2);
    }

    #[test]
    fn landmarks_are_scaled_to_frame() {
        let outputs = vec![
            ("Identity".to_string(), raw_landmarks()),
            ("Identity_1".to_string(), vec![0.9]),
        ];
        let hand = decode(&outputs, 100, (200, 50), 0.7).unwrap();
        assert_eq!(hand.points()[THUMB_TIP], vec2(80.0, 10.0));
        assert_eq!(hand.points()[INDEX_FINGER_TIP], vec2(160.0, 20.0));
    }

    #[test]
    fn low_presence_means_no_hand() {
        let outputs = vec![
            ("xyz_x21".to_string(), raw_landmarks()),
            ("hand_score".to_string(), vec![0.3]),
        ];
        assert!(decode(&outputs, 224, (640, 480), 0.7).is_none());
    }

    #[test]
    fn score_output_is_preferred_by_name() {
        let outputs = vec![
            ("xyz_x21".to_string(), raw_landmarks()),
            ("lefthand_0_or_righthand_1".to_string(), vec![0.0]),
            ("hand_score".to_string(), vec![0.95]),
        ];
        assert!(decode(&outputs, 224, (640, 480), 0.7).is_some());
    }

    #[test]
    fn logit_scores_are_squashed() {
        assert_eq!(presence(0.5), 0.5);
        assert!(presence(4.0) > 0.98);
        assert!(presence(-4.0) < 0.02);

        let outputs = vec![
            ("landmarks".to_string(), raw_landmarks()),
            ("score".to_string(), vec![-3.0]),
        ];
        assert!(decode(&outputs, 224, (640, 480), 0.7).is_none());
    }

    #[test]
    fn no_landmark_output_means_no_hand() {
        let outputs = vec![("score".to_string(), vec![0.99])];
        assert!(decode(&outputs, 224, (640, 480), 0.7).is_none());
    }
}
