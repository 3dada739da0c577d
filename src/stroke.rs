use std::collections::VecDeque;

use crate::{math::Vec2i, palette::PaintColor};

/// A single fingertip sample, tagged with the brush size that was selected when it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dab {
    pub pos: Vec2i,
    pub size: u32,
}

/// One continuous drawn line.
///
/// Entries are stored most-recent-first. A `None` entry is a gap: no segment is drawn across it.
/// Once the stroke holds `capacity` entries, pushing a new one drops the oldest.
#[derive(Debug, Clone)]
pub struct Stroke {
    entries: VecDeque<Option<Dab>>,
    capacity: usize,
}

impl Stroke {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, dab: Dab) {
        self.push_entry(Some(dab));
    }

    /// Lifts the pen without ending the stroke.
    ///
    /// Does nothing on an empty stroke or right after another gap.
    pub fn push_gap(&mut self) {
        if matches!(self.entries.front(), Some(Some(_))) {
            self.push_entry(None);
        }
    }

    fn push_entry(&mut self, entry: Option<Dab>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positions of all recorded samples, newest first.
    #[cfg(test)]
    pub fn points(&self) -> impl Iterator<Item = Vec2i> + '_ {
        self.entries.iter().flatten().map(|dab| dab.pos)
    }

    /// Consecutive `(newer, older)` sample pairs that form drawable segments.
    pub fn segments(&self) -> impl Iterator<Item = (Dab, Dab)> + '_ {
        self.entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .filter_map(|(newer, older)| Some(((*newer)?, (*older)?)))
    }
}

/// All strokes of one color, plus the index of the stroke that is currently being drawn.
#[derive(Debug, Clone)]
pub struct ColorBucket {
    strokes: Vec<Stroke>,
    active: usize,
}

impl ColorBucket {
    fn new(capacity: usize) -> Self {
        Self {
            strokes: vec![Stroke::new(capacity)],
            active: 0,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[cfg(test)]
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Stroke {
        &self.strokes[self.active]
    }

    fn active_mut(&mut self) -> &mut Stroke {
        &mut self.strokes[self.active]
    }

    fn start_stroke(&mut self, capacity: usize) {
        self.strokes.push(Stroke::new(capacity));
        self.active = self.strokes.len() - 1;
    }
}

/// The per-color stroke buffers of a drawing session.
#[derive(Debug, Clone)]
pub struct Strokes {
    buckets: [ColorBucket; PaintColor::ALL.len()],
    capacity: usize,
}

impl Strokes {
    /// `capacity` is the maximum number of entries a single stroke may hold.
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: PaintColor::ALL.map(|_| ColorBucket::new(capacity)),
            capacity,
        }
    }

    pub fn bucket(&self, color: PaintColor) -> &ColorBucket {
        &self.buckets[color.index()]
    }

    /// Prepends a sample to the active stroke of `color`.
    pub fn append(&mut self, color: PaintColor, dab: Dab) {
        self.buckets[color.index()].active_mut().push(dab);
    }

    pub fn lift(&mut self, color: PaintColor) {
        self.buckets[color.index()].active_mut().push_gap();
    }

    /// Ends the active stroke of every color and opens a fresh empty one in each.
    pub fn new_stroke(&mut self) {
        for bucket in &mut self.buckets {
            bucket.start_stroke(self.capacity);
        }
    }

    /// Drops everything, leaving each color with a single empty stroke.
    pub fn reset(&mut self) {
        *self = Self::new(self.capacity);
    }

    /// Buckets in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = (PaintColor, &ColorBucket)> {
        PaintColor::ALL.into_iter().zip(&self.buckets)
    }
}
