//! vision-detect: camera frames, object detection and a debug overlay
//!
//! The default build enables scripted `mock` sources so the guidance loop can
//! be exercised on any host. The `opencv` feature adds a real camera, a
//! YOLO-style ONNX detector run through OpenCV DNN, and a HighGUI window.

mod types;
pub use types::{BoundingBox, ComputeDevice, Detection, Frame, PixelFormat};

mod error;
pub use error::{Error, Result};

mod traits;
pub use traits::{DebugDisplay, Detector, FrameSource, NullDisplay};

pub mod labels;

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MockCamera, ScriptedDetector, ScriptedSource};

#[cfg(feature = "opencv")]
mod opencv_backend;
#[cfg(feature = "opencv")]
pub use opencv_backend::{HighGuiDisplay, OnnxDetector, OpenCvCamera};
