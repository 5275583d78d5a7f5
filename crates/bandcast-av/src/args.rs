//! Engine argument synthesis.
//!
//! Pure mapping from a [`ConversionParams`] to the ordered argument list the
//! external engine understands. Quality is the only knob the retry loop
//! varies, so everything else here is a function of the request alone.

use bandcast_core::config::ConvertConfig;
use bandcast_core::ConversionParams;

/// Build the video filter chain for one request.
///
/// With an explicit crop the source rectangle is cut first, then scaled down
/// into the target (padded and centered if the aspect ratios differ). Without
/// one, the source is scaled *up* until it covers the target and the excess
/// is cropped symmetrically, so the output never carries letterbox bars.
pub fn filter_chain(params: &ConversionParams) -> String {
    let w = params.target_width;
    let h = params.target_height;

    let mut filters = Vec::new();

    match params.crop_region {
        Some(crop) => {
            filters.push(format!(
                "crop={}:{}:{}:{}",
                crop.width, crop.height, crop.x, crop.y
            ));
            filters.push(format!("scale={w}:{h}:force_original_aspect_ratio=decrease"));
            filters.push(format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"));
        }
        None => {
            filters.push(format!("scale={w}:{h}:force_original_aspect_ratio=increase"));
            filters.push(format!("crop={w}:{h}"));
        }
    }

    filters.push(format!("fps={}", params.fps));
    filters.join(",")
}

/// Synthesize the full engine argument list for one encode attempt.
///
/// The caller is expected to have run [`ConversionParams::validate`] first;
/// this function is pure and performs no checking of its own.
pub fn synthesize(params: &ConversionParams, cfg: &ConvertConfig) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into()];

    if let Some(start) = params.start_time {
        if start > 0.0 {
            args.push("-ss".into());
            args.push(start.to_string());
        }
    }

    args.push("-i".into());
    args.push(params.source_path.to_string_lossy().into_owned());

    if let Some(duration) = params.duration {
        if duration > 0.0 {
            args.push("-t".into());
            args.push(duration.to_string());
        }
    }

    args.push("-vf".into());
    args.push(filter_chain(params));

    // Fixed encoder selection: single-frame-intra video, mono PCM audio, AVI
    // container. The peripheral's playback path depends on this exact layout.
    args.extend([
        "-c:v".to_string(),
        "mjpeg".to_string(),
        "-q:v".to_string(),
        params.quality.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        "-ar".to_string(),
        cfg.audio_sample_rate.to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "avi".to_string(),
    ]);

    args.push(params.output_path.to_string_lossy().into_owned());

    args
}
