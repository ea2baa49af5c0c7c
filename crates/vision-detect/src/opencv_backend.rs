use crate::{
    BoundingBox, ComputeDevice, DebugDisplay, Detection, Detector, Error, Frame, FrameSource,
    PixelFormat, Result,
};
use opencv::prelude::*;
use opencv::{core, dnn, highgui, imgproc, videoio};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

fn backend(e: opencv::Error) -> Error {
    Error::Backend(e.to_string())
}

/// Convert any [`Frame`] into a BGR `Mat` owned by OpenCV.
fn frame_to_bgr(frame: &Frame) -> Result<core::Mat> {
    let channels = match frame.pixel_format {
        PixelFormat::Gray8 => 1,
        PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
    };
    let flat = core::Mat::from_slice(&frame.data).map_err(backend)?;
    let shaped = flat
        .reshape(channels, frame.height as i32)
        .map_err(backend)?;
    let mut bgr = core::Mat::default();
    match frame.pixel_format {
        PixelFormat::Bgr8 => shaped.copy_to(&mut bgr).map_err(backend)?,
        PixelFormat::Rgb8 => imgproc::cvt_color(&shaped, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
            .map_err(backend)?,
        PixelFormat::Gray8 => imgproc::cvt_color(&shaped, &mut bgr, imgproc::COLOR_GRAY2BGR, 0)
            .map_err(backend)?,
    }
    Ok(bgr)
}

pub struct OpenCvCamera {
    spec: String,
    cap: videoio::VideoCapture,
}

impl OpenCvCamera {
    /// Open a camera by device index ("0") or a video file path.
    pub fn open(spec: &str) -> Result<Self> {
        let cap = if let Ok(idx) = spec.parse::<i32>() {
            videoio::VideoCapture::new(idx, videoio::CAP_ANY).map_err(backend)?
        } else {
            videoio::VideoCapture::from_file(spec, videoio::CAP_ANY).map_err(backend)?
        };
        let opened = videoio::VideoCapture::is_opened(&cap).map_err(backend)?;
        if !opened {
            return Err(Error::NotFound(spec.to_string()));
        }
        info!("Opened camera {}", spec);
        Ok(Self {
            spec: spec.to_string(),
            cap,
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = core::Mat::default();
        let ok = self.cap.read(&mut mat).map_err(backend)?;
        if !ok || mat.empty() {
            return Ok(None);
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;

        let mut rgb = core::Mat::default();
        imgproc::cvt_color(&mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(backend)?;

        let data = rgb.data_bytes().map_err(backend)?.to_vec();
        Ok(Some(Frame {
            width,
            height,
            pixel_format: PixelFormat::Rgb8,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        }))
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            warn!("Failed to release camera {}: {}", self.spec, e);
        } else {
            debug!("Released camera {}", self.spec);
        }
    }
}

/// YOLOv8-style ONNX detector executed with OpenCV DNN.
///
/// Expects a single output of shape `[1, 4 + classes, candidates]` with
/// centre-based boxes in input-image pixels.
pub struct OnnxDetector {
    net: dnn::Net,
    labels: Vec<String>,
    input_size: i32,
    score_floor: f32,
    nms_threshold: f32,
}

impl OnnxDetector {
    pub fn load(model_path: &str, labels: Vec<String>, device: ComputeDevice) -> Result<Self> {
        let mut net = dnn::read_net_from_onnx(model_path).map_err(backend)?;
        let use_cuda = match device {
            ComputeDevice::Cuda => true,
            ComputeDevice::Cpu => false,
            ComputeDevice::Auto => core::get_cuda_enabled_device_count()
                .map(|n| n > 0)
                .unwrap_or(false),
        };
        if use_cuda {
            net.set_preferable_backend(dnn::DNN_BACKEND_CUDA)
                .map_err(backend)?;
            net.set_preferable_target(dnn::DNN_TARGET_CUDA)
                .map_err(backend)?;
        } else {
            net.set_preferable_backend(dnn::DNN_BACKEND_OPENCV)
                .map_err(backend)?;
            net.set_preferable_target(dnn::DNN_TARGET_CPU)
                .map_err(backend)?;
        }
        info!(
            "Loaded detector {} ({} classes) on {}",
            model_path,
            labels.len(),
            if use_cuda { "cuda" } else { "cpu" }
        );
        Ok(Self {
            net,
            labels,
            input_size: 640,
            score_floor: 0.25,
            nms_threshold: 0.45,
        })
    }

    fn forward(&mut self, frame: &Frame) -> Result<Vec<f32>> {
        let bgr = frame_to_bgr(frame)?;
        let blob = dnn::blob_from_image(
            &bgr,
            1.0 / 255.0,
            core::Size::new(self.input_size, self.input_size),
            core::Scalar::default(),
            true,
            false,
            core::CV_32F,
        )
        .map_err(backend)?;
        self.net
            .set_input(&blob, "", 1.0, core::Scalar::default())
            .map_err(backend)?;

        let names = self.net.get_unconnected_out_layers_names().map_err(backend)?;
        let mut outputs = core::Vector::<core::Mat>::new();
        self.net.forward(&mut outputs, &names).map_err(backend)?;
        let out = outputs.get(0).map_err(backend)?;
        Ok(out.data_typed::<f32>().map_err(backend)?.to_vec())
    }
}

impl Detector for OnnxDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let raw = self.forward(frame)?;
        let attributes = 4 + self.labels.len();
        if attributes == 4 || raw.len() % attributes != 0 {
            return Err(Error::Detector(format!(
                "output of {} values does not match {} classes",
                raw.len(),
                self.labels.len()
            )));
        }
        let candidates = raw.len() / attributes;
        let sx = frame.width as f32 / self.input_size as f32;
        let sy = frame.height as f32 / self.input_size as f32;

        let mut rects = core::Vector::<core::Rect>::new();
        let mut scores = core::Vector::<f32>::new();
        let mut found = Vec::new();
        for j in 0..candidates {
            let (class, score) = (0..self.labels.len())
                .map(|c| (c, raw[(4 + c) * candidates + j]))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if score < self.score_floor {
                continue;
            }
            let (cx, cy) = (raw[j] * sx, raw[candidates + j] * sy);
            let (w, h) = (raw[2 * candidates + j] * sx, raw[3 * candidates + j] * sy);
            let bbox = BoundingBox::new(cx - w / 2.0, cy - h / 2.0, w, h);
            rects.push(core::Rect::new(
                bbox.x as i32,
                bbox.y as i32,
                bbox.width as i32,
                bbox.height as i32,
            ));
            scores.push(score);
            found.push((class, score, bbox));
        }

        let mut keep = core::Vector::<i32>::new();
        dnn::nms_boxes(
            &rects,
            &scores,
            self.score_floor,
            self.nms_threshold,
            &mut keep,
            1.0,
            0,
        )
        .map_err(backend)?;

        let detections: Vec<Detection> = keep
            .iter()
            .filter_map(|i| found.get(i as usize))
            .map(|(class, score, bbox)| Detection::new(self.labels[*class].clone(), *score, *bbox))
            .collect();
        debug!("Detected {} objects", detections.len());
        Ok(detections)
    }
}

/// HighGUI window drawing boxes and labels; `q` requests quit.
pub struct HighGuiDisplay {
    window: String,
}

impl HighGuiDisplay {
    pub fn new(window: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE).map_err(backend)?;
        Ok(Self {
            window: window.to_string(),
        })
    }

    fn render(&mut self, frame: &Frame, detections: &[Detection]) -> Result<()> {
        let mut bgr = frame_to_bgr(frame)?;
        let color = core::Scalar::new(0.0, 255.0, 0.0, 0.0);
        for d in detections {
            let rect = core::Rect::new(
                d.bbox.x as i32,
                d.bbox.y as i32,
                d.bbox.width as i32,
                d.bbox.height as i32,
            );
            imgproc::rectangle(&mut bgr, rect, color, 2, imgproc::LINE_8, 0).map_err(backend)?;
            imgproc::put_text(
                &mut bgr,
                &format!("{} {:.2}", d.label, d.confidence),
                core::Point::new(rect.x, (rect.y - 5).max(10)),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                color,
                1,
                imgproc::LINE_8,
                false,
            )
            .map_err(backend)?;
        }
        highgui::imshow(&self.window, &bgr).map_err(backend)
    }
}

impl DebugDisplay for HighGuiDisplay {
    fn show(&mut self, frame: &Frame, detections: &[Detection]) {
        if let Err(e) = self.render(frame, detections) {
            warn!("Debug display failed: {}", e);
        }
    }

    fn poll_quit_key(&mut self) -> bool {
        match highgui::wait_key(1) {
            Ok(key) => key & 0xFF == i32::from(b'q'),
            Err(e) => {
                warn!("Debug display key poll failed: {}", e);
                false
            }
        }
    }
}

impl Drop for HighGuiDisplay {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.window);
    }
}
