//! Timeline tracks and keyframes.
//!
//! A [`KeyFrame`] has no identity: it is addressed by its slot in the
//! track's list. The list is kept in insertion/edit order; frame order is
//! established at query time by sorting.

use std::collections::HashSet;

/// Display color of a new track (RGBA).
pub const DEFAULT_TRACK_COLOR: [u8; 4] = [200, 200, 200, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyFrame {
    pub frame: i32,
    pub value: f64,
}

impl KeyFrame {
    pub fn new(frame: i32, value: f64) -> Self {
        Self { frame, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub color: [u8; 4],
    keyframes: Vec<KeyFrame>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_TRACK_COLOR,
            keyframes: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Keyframes in storage order.
    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    pub(crate) fn keyframes_mut(&mut self) -> &mut Vec<KeyFrame> {
        &mut self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// First keyframe sitting exactly on `frame`.
    pub fn get_keyframe_at_frame(&self, frame: i32) -> Option<&KeyFrame> {
        self.keyframes.iter().find(|k| k.frame == frame)
    }

    /// Storage slot of the first keyframe on `frame`.
    pub fn position_of_frame(&self, frame: i32) -> Option<usize> {
        self.keyframes.iter().position(|k| k.frame == frame)
    }

    /// Keyframes ordered by frame number (stable for equal frames).
    pub fn sorted_keyframes(&self) -> Vec<KeyFrame> {
        let mut sorted = self.keyframes.clone();
        sorted.sort_by_key(|k| k.frame);
        sorted
    }

    /// Nearest keyframes strictly before and strictly after `frame`, ignoring
    /// any whose frame number is in `exclude`. A keyframe exactly on `frame`
    /// is neither.
    pub fn get_adjacent_keyframes(
        &self,
        frame: i32,
        exclude: &HashSet<i32>,
    ) -> (Option<KeyFrame>, Option<KeyFrame>) {
        let mut prev = None;
        let mut next = None;
        for kf in self.sorted_keyframes() {
            if exclude.contains(&kf.frame) {
                continue;
            }
            if kf.frame < frame {
                prev = Some(kf);
            } else if kf.frame > frame {
                next = Some(kf);
                break;
            }
        }
        (prev, next)
    }

    /// Whether a keyframe currently at `from` may land on `to` without
    /// touching or crossing a non-excluded neighbour, inside `[start, end]`.
    pub fn can_place(&self, from: i32, to: i32, exclude: &HashSet<i32>, start: i32, end: i32) -> bool {
        if to < start || to > end {
            return false;
        }
        let (prev, next) = self.get_adjacent_keyframes(from, exclude);
        prev.is_none_or(|p| to > p.frame) && next.is_none_or(|n| to < n.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(frames: &[i32]) -> Track {
        let mut t = Track::new("x");
        for &f in frames {
            t.keyframes_mut().push(KeyFrame::new(f, f as f64));
        }
        t
    }

    #[test]
    fn test_adjacent_with_exclusion() {
        let t = track(&[30, 10, 20]);
        let exclude: HashSet<i32> = [20].into_iter().collect();
        let (prev, next) = t.get_adjacent_keyframes(15, &exclude);
        assert_eq!(prev.map(|k| k.frame), Some(10));
        assert_eq!(next.map(|k| k.frame), Some(30));

        let (prev, next) = t.get_adjacent_keyframes(15, &HashSet::new());
        assert_eq!(prev.map(|k| k.frame), Some(10));
        assert_eq!(next.map(|k| k.frame), Some(20));
    }

    #[test]
    fn test_adjacent_strict() {
        let t = track(&[10, 20, 30]);
        let (prev, next) = t.get_adjacent_keyframes(20, &HashSet::new());
        assert_eq!(prev.map(|k| k.frame), Some(10));
        assert_eq!(next.map(|k| k.frame), Some(30));

        let (prev, next) = t.get_adjacent_keyframes(5, &HashSet::new());
        assert!(prev.is_none());
        assert_eq!(next.map(|k| k.frame), Some(10));
        assert_eq!(t.get_adjacent_keyframes(31, &HashSet::new()).1, None);
    }

    #[test]
    fn test_can_place() {
        let t = track(&[20, 25]);
        let none = HashSet::new();
        assert!(t.can_place(20, 24, &none, 0, 200));
        assert!(!t.can_place(20, 25, &none, 0, 200));
        assert!(!t.can_place(20, 26, &none, 0, 200));
        assert!(!t.can_place(20, -1, &none, 0, 200));
        // Excluding the neighbour lets it pass
        let ex: HashSet<i32> = [25].into_iter().collect();
        assert!(t.can_place(20, 26, &ex, 0, 200));
        assert!(!t.can_place(20, 201, &ex, 0, 200));
    }

    #[test]
    fn test_sorted_does_not_reorder_storage() {
        let t = track(&[3, 1, 2]);
        let sorted: Vec<i32> = t.sorted_keyframes().iter().map(|k| k.frame).collect();
        assert_eq!(sorted, vec![1, 2, 3]);
        assert_eq!(t.keyframes()[0].frame, 3);
        assert_eq!(t.get_keyframe_at_frame(2).map(|k| k.value), Some(2.0));
        assert!(t.get_keyframe_at_frame(4).is_none());
    }
}
