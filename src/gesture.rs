use crate::{
    config,
    math::{Vec2f, Vec2i},
};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;

/// Landmark pairs joined by a line when drawing the hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, 1),
    (1, 2),
    (2, 3),
    (3, THUMB_TIP),
    (WRIST, 5),
    (5, 6),
    (6, 7),
    (7, INDEX_FINGER_TIP),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (WRIST, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

/// The 21 keypoints of a detected hand, in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Vec2f; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Vec2f; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec2f; LANDMARK_COUNT] {
        &self.points
    }

    /// Landmark `index`, snapped to the pixel grid.
    pub fn pixel(&self, index: usize) -> Vec2i {
        self.points[index].as_i32()
    }

    pub fn thumb_tip(&self) -> Vec2i {
        self.pixel(THUMB_TIP)
    }

    pub fn index_tip(&self) -> Vec2i {
        self.pixel(INDEX_FINGER_TIP)
    }
}

/// What a single frame's hand pose asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    NoHand,
    /// Thumb and index fingertip are touching: lift the pen.
    Pinch,
    /// The fingertip is inside the reserved strip at the top of the frame.
    InUiBand { fingertip: Vec2i },
    /// The fingertip is somewhere it may draw.
    Point { fingertip: Vec2i },
}

pub struct GestureInterpreter {
    pinch_threshold: f32,
    ui_band_height: i32,
}

impl GestureInterpreter {
    pub fn new(config: &config::Gesture) -> Self {
        Self {
            pinch_threshold: config.pinch_threshold,
            ui_band_height: config.ui_band_height,
        }
    }

    pub fn interpret(&self, hand: Option<&HandLandmarks>) -> Gesture {
        let Some(hand) = hand else {
            return Gesture::NoHand;
        };

        let fingertip = hand.index_tip();
        let distance = hand.thumb_tip().as_f32().dist(fingertip.as_f32());
        if distance < self.pinch_threshold {
            Gesture::Pinch
        } else if fingertip.y() <= self.ui_band_height {
            Gesture::InUiBand { fingertip }
        } else {
            Gesture::Point { fingertip }
        }
    }
}
