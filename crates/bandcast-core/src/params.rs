//! Conversion request model and device budget constants.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hard per-stream decode buffer budget the device accepts, in bytes.
pub const BUFFER_SIZE_LIMIT: u32 = 20 * 1024;

/// Maximum number of lower-quality re-encodes per output path.
pub const MAX_RETRY: u32 = 3;

/// Worst MJPEG quantizer value (smallest expected output).
pub const MAX_QUALITY: u32 = 31;

/// Best MJPEG quantizer value.
pub const MIN_QUALITY: u32 = 1;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 5;

/// Default MJPEG quantizer.
pub const DEFAULT_QUALITY: u32 = 10;

/// Fixed mono PCM sample rate for the audio stream.
pub const AUDIO_SAMPLE_RATE: u32 = 8000;

/// Crop rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Immutable description of one conversion request.
///
/// `target_width`/`target_height` are the device's native display resolution;
/// the system does not discover them. When `crop_region` is absent, a
/// fill-and-center-crop policy applies so the output never carries letterbox
/// bars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Source video path.
    pub source_path: PathBuf,
    /// Destination AVI path. Exclusively owned by the active attempt.
    pub output_path: PathBuf,
    /// Device display width in pixels.
    pub target_width: u32,
    /// Device display height in pixels.
    pub target_height: u32,
    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// MJPEG quantizer in `1..=31`; higher means lower fidelity.
    #[serde(default = "default_quality")]
    pub quality: u32,
    /// Trim start in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Trim length in seconds; zero means "to end".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Optional source crop applied before scaling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_region: Option<CropRegion>,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_quality() -> u32 {
    DEFAULT_QUALITY
}

impl ConversionParams {
    /// Create a request with default fps and quality.
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            target_width,
            target_height,
            fps: DEFAULT_FPS,
            quality: DEFAULT_QUALITY,
            start_time: None,
            duration: None,
            crop_region: None,
        }
    }

    /// Builder: set the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Builder: set the quantizer.
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Builder: set the trim window.
    pub fn with_trim(mut self, start_time: Option<f64>, duration: Option<f64>) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    /// Builder: set an explicit crop rectangle.
    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop_region = Some(crop);
        self
    }

    /// Fail fast on malformed requests, before any engine invocation.
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(Error::validation(format!(
                "target dimensions must be positive, got {}x{}",
                self.target_width, self.target_height
            )));
        }
        if self.fps == 0 {
            return Err(Error::validation("fps must be positive"));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(Error::validation(format!(
                "quality {} outside {}..={}",
                self.quality, MIN_QUALITY, MAX_QUALITY
            )));
        }
        if let Some(start) = self.start_time {
            if !start.is_finite() || start < 0.0 {
                return Err(Error::validation(format!("start_time {start} is negative")));
            }
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(Error::validation(format!("duration {duration} is negative")));
            }
        }
        if let Some(crop) = self.crop_region {
            if crop.width == 0 || crop.height == 0 {
                return Err(Error::validation(format!(
                    "crop region must have positive area, got {}x{}",
                    crop.width, crop.height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params() -> ConversionParams {
        ConversionParams::new("/in/clip.mp4", "/out/clip.avi", 320, 384)
    }

    #[test]
    fn defaults_applied() {
        let params = valid_params();
        assert_eq!(params.fps, 5);
        assert_eq!(params.quality, 10);
        assert!(params.crop_region.is_none());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn zero_dimension_rejected() {
        let mut params = valid_params();
        params.target_height = 0;
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("target dimensions"));
    }

    #[test]
    fn quality_out_of_band_rejected() {
        assert!(valid_params().with_quality(0).validate().is_err());
        assert!(valid_params().with_quality(32).validate().is_err());
        assert!(valid_params().with_quality(31).validate().is_ok());
        assert!(valid_params().with_quality(1).validate().is_ok());
    }

    #[test]
    fn negative_trim_rejected() {
        let params = valid_params().with_trim(Some(-1.0), None);
        assert!(params.validate().is_err());
        let params = valid_params().with_trim(None, Some(-0.5));
        assert!(params.validate().is_err());
        // Zero duration means "to end" and is valid.
        let params = valid_params().with_trim(Some(0.0), Some(0.0));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn empty_crop_rejected() {
        let params = valid_params().with_crop(CropRegion {
            x: 0,
            y: 0,
            width: 0,
            height: 100,
        });
        assert!(params.validate().is_err());
    }

    #[test]
    fn serde_round_trip_keeps_optionals() {
        let params = valid_params()
            .with_trim(Some(1.5), Some(8.0))
            .with_crop(CropRegion {
                x: 10,
                y: 20,
                width: 300,
                height: 200,
            });
        let json = serde_json::to_string(&params).unwrap();
        let back: ConversionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.crop_region, params.crop_region);
        assert_eq!(back.start_time, params.start_time);
    }

    #[test]
    fn serde_defaults_when_fields_missing() {
        let json = r#"{
            "source_path": "/in/a.mp4",
            "output_path": "/out/a.avi",
            "target_width": 320,
            "target_height": 384
        }"#;
        let params: ConversionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.fps, DEFAULT_FPS);
        assert_eq!(params.quality, DEFAULT_QUALITY);
    }
}
