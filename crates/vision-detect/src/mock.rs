use crate::{Detection, Detector, Error, Frame, FrameSource, PixelFormat, Result};
use std::collections::VecDeque;
use std::time::Duration;
use time::OffsetDateTime;

/// Synthetic camera producing a gray ramp, optionally for a fixed number of frames.
pub struct MockCamera {
    width: u32,
    height: u32,
    counter: u64,
    limit: Option<u64>,
    frame_interval: Duration,
}

impl MockCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counter: 0,
            limit: None,
            frame_interval: Duration::ZERO,
        }
    }

    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Sleep this long before each frame, like a device running at a fixed rate
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl FrameSource for MockCamera {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.is_some_and(|limit| self.counter >= limit) {
            return Ok(None);
        }
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        self.counter += 1;
        let (width, height) = (self.width, self.height);
        let mut data = vec![0u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                data[(y * width + x) as usize] = ((x + y + self.counter as u32) % 256) as u8;
            }
        }
        Ok(Some(Frame {
            width,
            height,
            pixel_format: PixelFormat::Gray8,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        }))
    }
}

/// Plays back a fixed list of frames, then reports end of stream.
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `count` blank frames of the given size
    pub fn blank(count: usize, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|_| Frame::blank(width, height)))
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// Returns one scripted detection list per call; empty once the script runs out.
pub struct ScriptedDetector {
    script: VecDeque<Vec<Detection>>,
    fail_at: Option<usize>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Vec<Detection>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fail_at: None,
            calls: 0,
        }
    }

    /// Same detections on every one of `frames` calls
    pub fn repeating(detections: Vec<Detection>, frames: usize) -> Self {
        Self::new(std::iter::repeat(detections).take(frames))
    }

    /// Make the call with zero-based index `call` fail
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(Error::Detector(format!("scripted failure on call {call}")));
        }
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    #[test]
    fn test_mock_camera_limit() {
        let mut cam = MockCamera::new(8, 4).with_limit(2);
        let frame = cam.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.len(), 32);
        assert!(cam.next_frame().unwrap().is_some());
        assert!(cam.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_scripted_source_ends() {
        let mut src = ScriptedSource::blank(1, 640, 480);
        assert_eq!(src.next_frame().unwrap().unwrap().width, 640);
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_scripted_detector_failure_injection() {
        let person = Detection::new("person", 0.9, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let mut det = ScriptedDetector::repeating(vec![person], 3).failing_at(1);
        let frame = Frame::blank(640, 480);
        assert_eq!(det.detect(&frame).unwrap().len(), 1);
        assert!(det.detect(&frame).is_err());
        assert_eq!(det.detect(&frame).unwrap().len(), 1);
        assert_eq!(det.detect(&frame).unwrap().len(), 1);
        assert!(det.detect(&frame).unwrap().is_empty());
    }
}
