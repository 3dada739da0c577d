use std::ops::RangeInclusive;

use image::RgbaImage;

use crate::{
    camera::FrameSource,
    cmd::{Cmd, Mode},
    config::Config,
    detector::LandmarkDetector,
    gesture::{Gesture, GestureInterpreter, HandLandmarks},
    palette::PaintColor,
    render,
    stroke::{Dab, Strokes},
};

pub const BRUSH_SIZES: RangeInclusive<u32> = 1..=20;

/// Everything the user has drawn, plus the current tool selection.
pub struct Session {
    strokes: Strokes,
    canvas: RgbaImage,
    mode: Mode,
    color: PaintColor,
    brush_size: u32,
    status: String,
    interpreter: GestureInterpreter,
    lift_on_hand_lost: bool,
    hand_visible: bool,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            strokes: Strokes::new(config.canvas.max_stroke_len),
            canvas: render::blank_canvas(config.camera.width, config.camera.height),
            mode: Mode::Drawing,
            color: config.canvas.color,
            brush_size: clamp_brush(config.canvas.brush_size as i64),
            status: "Ready".into(),
            interpreter: GestureInterpreter::new(&config.gesture),
            lift_on_hand_lost: config.gesture.lift_on_hand_lost,
            hand_visible: false,
        }
    }

    pub fn strokes(&self) -> &Strokes {
        &self.strokes
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn color(&self) -> PaintColor {
        self.color
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    /// Describes the last action that changed the session.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn apply(&mut self, cmd: Cmd) {
        log::debug!("{cmd:?}");
        match cmd {
            Cmd::Clear => self.clear(),
            Cmd::ToggleMode => self.toggle_mode(),
            Cmd::SetColor { color } => self.set_color(color),
            Cmd::SetBrushSize { size } => self.set_brush_size(size),
            Cmd::AdjustBrushSize { delta } => {
                self.set_brush_size(clamp_brush(self.brush_size as i64 + delta as i64))
            }
        }
    }

    pub fn set_color(&mut self, color: PaintColor) {
        self.color = color;
        self.status = format!("Selected color: {color}");
    }

    /// Only affects segments recorded from now on.
    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = clamp_brush(size as i64);
        self.status = format!("Brush size: {}", self.brush_size);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        log::info!("switched to {:?} mode", self.mode);
        self.status = match self.mode {
            Mode::Drawing => "Drawing mode: ON",
            Mode::Navigation => "Drawing mode: OFF",
        }
        .into();
    }

    pub fn clear(&mut self) {
        log::info!("clearing canvas");
        let (width, height) = self.canvas.dimensions();
        self.canvas = render::blank_canvas(width, height);
        self.strokes.reset();
        self.status = "Canvas cleared".into();
    }

    /// Applies one frame's hand pose to the stroke buffers and renders all strokes onto both
    /// `frame` and the canvas.
    pub fn process(&mut self, frame: &mut RgbaImage, hand: Option<&HandLandmarks>) -> Gesture {
        let gesture = self.interpreter.interpret(hand);
        log::trace!("{gesture:?}");

        match gesture {
            Gesture::NoHand => {
                if self.hand_visible && self.lift_on_hand_lost && self.mode == Mode::Drawing {
                    self.strokes.lift(self.color);
                }
            }
            Gesture::Pinch => {
                if self.mode == Mode::Drawing {
                    log::trace!(
                        "pen lifted, {} stroke has {} points",
                        self.color,
                        self.strokes.bucket(self.color).active().len()
                    );
                    self.strokes.new_stroke();
                }
            }
            Gesture::InUiBand { fingertip } => {
                log::trace!("fingertip {fingertip:?} inside the control band");
            }
            Gesture::Point { fingertip } => {
                if self.mode == Mode::Drawing {
                    self.strokes.append(
                        self.color,
                        Dab {
                            pos: fingertip,
                            size: self.brush_size,
                        },
                    );
                }
            }
        }
        self.hand_visible = hand.is_some();

        if let Some(hand) = hand {
            render::draw_hand(frame, hand);
        }
        render::render_strokes(&self.strokes, &mut [frame, &mut self.canvas]);

        gesture
    }

    /// Runs one capture → detect → draw cycle.
    ///
    /// Returns the annotated camera frame, or `None` if no frame could be read, in which case
    /// the session is left untouched.
    pub fn step(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn LandmarkDetector,
    ) -> Option<RgbaImage> {
        let mut frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("skipping frame: {e:#}");
                return None;
            }
        };

        let hand = match detector.detect(&frame) {
            Ok(hand) => hand,
            Err(e) => {
                log::warn!("hand detection failed: {e:#}");
                None
            }
        };

        self.process(&mut frame, hand.as_ref());
        Some(frame)
    }
}

fn clamp_brush(size: i64) -> u32 {
    size.clamp(*BRUSH_SIZES.start() as i64, *BRUSH_SIZES.end() as i64) as u32
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::{gesture::tests::hand, math::vec2, render::BACKGROUND};

    fn session() -> Session {
        Session::new(&Config::default())
    }

    fn frame() -> RgbaImage {
        render::blank_canvas(640, 480)
    }

    fn point(session: &mut Session, x: f32, y: f32) {
        let hand = hand((x + 100.0, y + 100.0), (x, y));
        session.process(&mut frame(), Some(&hand));
    }

    fn pinch(session: &mut Session) {
        let hand = hand((300.0, 300.0), (305.0, 300.0));
        assert_eq!(session.process(&mut frame(), Some(&hand)), Gesture::Pinch);
    }

    fn active_len(session: &Session, color: PaintColor) -> usize {
        session.strokes().bucket(color).active().len()
    }

    #[test]
    fn starts_with_defaults() {
        let session = session();
        assert_eq!(session.status(), "Ready");
        assert_eq!(session.color(), PaintColor::Black);
        assert_eq!(session.brush_size(), 5);
        assert_eq!(session.mode(), Mode::Drawing);
        assert_eq!(session.canvas().dimensions(), (640, 480));
    }

    #[test]
    fn red_then_blue_after_pinch() {
        let mut session = session();
        session.apply(Cmd::SetColor {
            color: PaintColor::Red,
        });
        // The default control band covers y <= 65, so the points sit further down the frame.
        for p in [10.0, 20.0, 30.0] {
            point(&mut session, p * 10.0, p * 10.0);
        }
        pinch(&mut session);
        session.apply(Cmd::SetColor {
            color: PaintColor::Blue,
        });
        point(&mut session, 400.0, 400.0);
        point(&mut session, 410.0, 410.0);

        let red = session.strokes().bucket(PaintColor::Red);
        assert_eq!(red.strokes().len(), 2);
        assert_eq!(
            red.strokes()[0].points().collect::<Vec<_>>(),
            [vec2(300, 300), vec2(200, 200), vec2(100, 100)]
        );
        assert!(red.active().is_empty());

        let blue = session.strokes().bucket(PaintColor::Blue);
        assert_eq!(blue.active_index(), 1);
        assert_eq!(blue.active().len(), 2);
    }

    #[test]
    fn literal_coordinates_below_an_empty_band() {
        let mut config = Config::default();
        config.gesture.ui_band_height = 0;
        let mut session = Session::new(&config);
        session.apply(Cmd::SetColor {
            color: PaintColor::Red,
        });
        for p in [10.0, 20.0, 30.0] {
            point(&mut session, p, p);
        }
        pinch(&mut session);
        session.apply(Cmd::SetColor {
            color: PaintColor::Blue,
        });
        point(&mut session, 40.0, 40.0);

        let red = session.strokes().bucket(PaintColor::Red);
        assert_eq!(
            red.strokes()[0].points().collect::<Vec<_>>(),
            [vec2(30, 30), vec2(20, 20), vec2(10, 10)]
        );
        assert!(red.active().is_empty());
        let blue = session.strokes().bucket(PaintColor::Blue).active();
        assert_eq!(blue.points().collect::<Vec<_>>(), [vec2(40, 40)]);
    }

    #[test]
    fn held_pinch_opens_empty_strokes() {
        let mut session = session();
        point(&mut session, 200.0, 200.0);
        for _ in 0..100 {
            pinch(&mut session);
        }
        point(&mut session, 210.0, 210.0);

        let black = session.strokes().bucket(PaintColor::Black);
        assert_eq!(black.strokes().len(), 101);
        assert_eq!(black.strokes()[0].len(), 1);
        assert!(black.strokes()[1..100].iter().all(|s| s.is_empty()));
        assert_eq!(black.active().len(), 1);
    }

    #[test]
    fn stroke_length_is_capped() {
        let mut config = Config::default();
        config.canvas.max_stroke_len = 8;
        let mut session = Session::new(&config);
        for i in 0..20 {
            point(&mut session, 100.0 + i as f32, 200.0);
            assert_eq!(active_len(&session, PaintColor::Black), (i + 1).min(8));
        }
    }

    #[test]
    fn pinch_opens_stroke_in_every_bucket() {
        let mut session = session();
        session.apply(Cmd::SetColor {
            color: PaintColor::Green,
        });
        pinch(&mut session);
        for (_, bucket) in session.strokes().iter() {
            assert_eq!(bucket.strokes().len(), 2);
            assert!(bucket.active().is_empty());
        }
    }

    #[test]
    fn navigation_mode_records_nothing() {
        let mut session = session();
        session.apply(Cmd::ToggleMode);
        assert_eq!(session.status(), "Drawing mode: OFF");

        point(&mut session, 100.0, 200.0);
        point(&mut session, 150.0, 250.0);
        pinch(&mut session);
        for (_, bucket) in session.strokes().iter() {
            assert_eq!(bucket.strokes().len(), 1);
            assert!(bucket.active().is_empty());
        }

        session.apply(Cmd::ToggleMode);
        assert_eq!(session.status(), "Drawing mode: ON");
        point(&mut session, 100.0, 200.0);
        assert_eq!(active_len(&session, PaintColor::Black), 1);
    }

    #[test]
    fn top_band_and_missing_hand_are_ignored() {
        let mut session = session();
        point(&mut session, 100.0, 40.0);
        session.process(&mut frame(), None);
        assert_eq!(active_len(&session, PaintColor::Black), 0);
    }

    #[test]
    fn hand_loss_lifts_pen_when_enabled() {
        let mut config = Config::default();
        config.gesture.lift_on_hand_lost = true;
        let mut session = Session::new(&config);

        point(&mut session, 100.0, 200.0);
        session.process(&mut frame(), None);
        session.process(&mut frame(), None);
        point(&mut session, 300.0, 200.0);

        let stroke = session.strokes().bucket(PaintColor::Black).active();
        assert_eq!(stroke.len(), 3);
        assert_eq!(stroke.segments().count(), 0);
    }

    #[test]
    fn clear_resets_strokes_and_canvas() {
        let mut session = session();
        point(&mut session, 100.0, 200.0);
        point(&mut session, 200.0, 200.0);
        pinch(&mut session);
        assert!(session.canvas().pixels().any(|&px| px != BACKGROUND));

        session.apply(Cmd::Clear);
        assert_eq!(session.status(), "Canvas cleared");
        assert!(session.canvas().pixels().all(|&px| px == BACKGROUND));
        for (_, bucket) in session.strokes().iter() {
            assert_eq!(bucket.strokes().len(), 1);
            assert!(bucket.active().is_empty());
        }
    }

    #[test]
    fn canvas_persists_between_frames() {
        let mut session = session();
        point(&mut session, 100.0, 200.0);
        point(&mut session, 200.0, 200.0);
        let drawn = session.canvas().clone();
        session.process(&mut frame(), None);
        assert_eq!(session.canvas(), &drawn);
    }

    #[test]
    fn brush_size_is_not_retroactive() {
        let mut session = session();
        session.apply(Cmd::SetBrushSize { size: 2 });
        point(&mut session, 100.0, 200.0);
        point(&mut session, 200.0, 200.0);
        session.apply(Cmd::SetBrushSize { size: 12 });
        point(&mut session, 300.0, 200.0);

        let sizes = session
            .strokes()
            .bucket(PaintColor::Black)
            .active()
            .segments()
            .map(|(newer, _)| newer.size)
            .collect::<Vec<_>>();
        assert_eq!(sizes, [12, 2]);

        let mut frame = frame();
        session.process(&mut frame, None);
        // 4px above the thin segment stays white, the thick one reaches it.
        assert_eq!(*frame.get_pixel(150, 196), BACKGROUND);
        assert_ne!(*frame.get_pixel(250, 196), BACKGROUND);
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut session = session();
        session.apply(Cmd::SetBrushSize { size: 0 });
        assert_eq!(session.brush_size(), 1);
        session.apply(Cmd::AdjustBrushSize { delta: -3 });
        assert_eq!(session.brush_size(), 1);
        session.apply(Cmd::SetBrushSize { size: 50 });
        assert_eq!(session.brush_size(), 20);
        session.apply(Cmd::AdjustBrushSize { delta: 1 });
        assert_eq!(session.brush_size(), 20);
        session.apply(Cmd::AdjustBrushSize { delta: -1 });
        assert_eq!(session.brush_size(), 19);
        assert_eq!(session.status(), "Brush size: 19");
    }

    #[test]
    fn color_selection_updates_status() {
        let mut session = session();
        session.apply(Cmd::SetColor {
            color: PaintColor::Yellow,
        });
        assert_eq!(session.color(), PaintColor::Yellow);
        assert_eq!(session.status(), "Selected color: yellow");
    }

    struct FailingCamera;

    impl FrameSource for FailingCamera {
        fn read_frame(&mut self) -> anyhow::Result<RgbaImage> {
            bail!("device unplugged")
        }
    }

    struct StillCamera;

    impl FrameSource for StillCamera {
        fn read_frame(&mut self) -> anyhow::Result<RgbaImage> {
            Ok(render::blank_canvas(640, 480))
        }
    }

    struct Scripted(Vec<Option<HandLandmarks>>);

    impl LandmarkDetector for Scripted {
        fn detect(&mut self, _frame: &RgbaImage) -> anyhow::Result<Option<HandLandmarks>> {
            Ok(self.0.remove(0))
        }
    }

    struct Broken;

    impl LandmarkDetector for Broken {
        fn detect(&mut self, _frame: &RgbaImage) -> anyhow::Result<Option<HandLandmarks>> {
            bail!("model crashed")
        }
    }

    #[test]
    fn unreadable_frames_are_skipped() {
        let mut session = session();
        let mut detector = Scripted(vec![Some(hand((0.0, 0.0), (100.0, 200.0)))]);
        assert!(session.step(&mut FailingCamera, &mut detector).is_none());
        assert_eq!(detector.0.len(), 1);
        assert_eq!(active_len(&session, PaintColor::Black), 0);
    }

    #[test]
    fn step_draws_onto_frame_and_canvas() {
        let mut session = session();
        let mut detector = Scripted(vec![
            Some(hand((0.0, 0.0), (100.0, 200.0))),
            Some(hand((0.0, 0.0), (200.0, 200.0))),
        ]);
        session.step(&mut StillCamera, &mut detector).unwrap();
        let frame = session.step(&mut StillCamera, &mut detector).unwrap();

        let black = render::paint(PaintColor::Black);
        assert_eq!(*frame.get_pixel(150, 200), black);
        assert_eq!(*session.canvas().get_pixel(150, 200), black);
    }

    #[test]
    fn detector_errors_count_as_no_hand() {
        let mut session = session();
        assert!(session.step(&mut StillCamera, &mut Broken).is_some());
        assert_eq!(active_len(&session, PaintColor::Black), 0);
    }
}
