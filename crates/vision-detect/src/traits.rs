use crate::{Detection, Frame, Result};

/// A stream of camera frames.
pub trait FrameSource {
    /// Read the next frame. `Ok(None)` means the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Object detector run once per frame.
pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Optional window showing annotated frames for a human operator.
pub trait DebugDisplay {
    fn show(&mut self, frame: &Frame, detections: &[Detection]);

    /// True when the operator asked to quit
    fn poll_quit_key(&mut self) -> bool {
        false
    }
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DebugDisplay for NullDisplay {
    fn show(&mut self, _frame: &Frame, _detections: &[Detection]) {}
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

impl<T: Detector + ?Sized> Detector for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}

impl<T: DebugDisplay + ?Sized> DebugDisplay for Box<T> {
    fn show(&mut self, frame: &Frame, detections: &[Detection]) {
        (**self).show(frame, detections)
    }

    fn poll_quit_key(&mut self) -> bool {
        (**self).poll_quit_key()
    }
}
