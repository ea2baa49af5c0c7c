//! Horizontal zone classification and per-frame occupancy.

use std::fmt;
use vision_detect::{BoundingBox, Detection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Left => "left",
            Zone::Center => "center",
            Zone::Right => "right",
        };
        f.write_str(name)
    }
}

/// Place a box into the left, center or right third of the frame.
///
/// Boundaries are whole pixels (`w / 3` and `2w / 3`, rounded down). Only
/// the box's left edge decides Left, and that check runs first: a wide box
/// starting in the left third is Left even if it reaches the right third.
pub fn classify(bbox: &BoundingBox, frame_width: u32) -> Zone {
    let width = u64::from(frame_width);
    let left_boundary = (width / 3) as f32;
    let right_boundary = (2 * width / 3) as f32;

    if bbox.x < left_boundary {
        Zone::Left
    } else if bbox.right() > right_boundary {
        Zone::Right
    } else {
        Zone::Center
    }
}

/// Zones holding at least one qualifying detection in the current frame,
/// plus the labels of those detections in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOccupancy {
    pub left: bool,
    pub center: bool,
    pub right: bool,
    pub labels: Vec<String>,
}

impl FrameOccupancy {
    /// Build occupancy from one frame's detections, keeping only those at or
    /// above `threshold`.
    pub fn from_detections(detections: &[Detection], frame_width: u32, threshold: f32) -> Self {
        let mut occupancy = Self::default();
        for detection in detections.iter().filter(|d| d.confidence >= threshold) {
            occupancy.record(detection, frame_width);
        }
        occupancy
    }

    pub fn record(&mut self, detection: &Detection, frame_width: u32) -> Zone {
        let zone = classify(&detection.bbox, frame_width);
        match zone {
            Zone::Left => self.left = true,
            Zone::Center => self.center = true,
            Zone::Right => self.right = true,
        }
        self.labels.push(detection.label.clone());
        zone
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Spoken summary such as `"Detected: person, chair, person"`
    pub fn summary(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!("Detected: {}", self.labels.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, width: f32) -> BoundingBox {
        BoundingBox::new(x, 50.0, width, 100.0)
    }

    #[test]
    fn test_classify_640() {
        assert_eq!(classify(&boxed(100.0, 50.0), 640), Zone::Left);
        assert_eq!(classify(&boxed(300.0, 250.0), 640), Zone::Right);
        assert_eq!(classify(&boxed(300.0, 50.0), 640), Zone::Center);
    }

    #[test]
    fn test_wide_box_from_left_is_left() {
        assert_eq!(classify(&boxed(10.0, 620.0), 640), Zone::Left);
    }

    #[test]
    fn test_boundaries() {
        // 640 px: left boundary 213, right boundary 426
        assert_eq!(classify(&boxed(212.9, 10.0), 640), Zone::Left);
        assert_eq!(classify(&boxed(213.0, 10.0), 640), Zone::Center);
        assert_eq!(classify(&boxed(400.0, 26.0), 640), Zone::Center);
        assert_eq!(classify(&boxed(300.0, 126.5), 640), Zone::Right);
        assert_eq!(classify(&boxed(400.0, 27.0), 640), Zone::Right);
    }

    #[test]
    fn test_classify_scales_with_width() {
        assert_eq!(classify(&boxed(300.0, 50.0), 1280), Zone::Left);
        assert_eq!(classify(&boxed(900.0, 50.0), 1280), Zone::Right);
    }

    #[test]
    fn test_occupancy_filters_and_keeps_duplicates() {
        let detections = vec![
            Detection::new("person", 0.9, boxed(300.0, 50.0)),
            Detection::new("dog", 0.5, boxed(10.0, 50.0)),
            Detection::new("person", 0.8, boxed(500.0, 50.0)),
        ];
        let occ = FrameOccupancy::from_detections(&detections, 640, 0.8);
        assert!(occ.center);
        assert!(occ.right);
        assert!(!occ.left);
        assert_eq!(occ.labels, vec!["person", "person"]);
        assert_eq!(occ.summary().unwrap(), "Detected: person, person");
    }

    #[test]
    fn test_empty_occupancy_has_no_summary() {
        let occ = FrameOccupancy::from_detections(&[], 640, 0.8);
        assert!(occ.is_empty());
        assert_eq!(occ.summary(), None);
    }
}
