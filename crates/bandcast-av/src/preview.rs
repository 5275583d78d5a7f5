//! Preview conversions for already-produced AVI files.
//!
//! The device consumes the AVI as-is; these helpers exist for the companion
//! side, which wants something a phone or browser can actually play back
//! (MP4), a tiny animated preview (GIF), or a single poster frame.

use std::path::Path;

use crate::engine::TranscodeEngine;

/// Remux/re-encode a produced AVI into an H.264 MP4 for local playback.
pub async fn remux_to_mp4(
    engine: &dyn TranscodeEngine,
    avi_path: &Path,
    mp4_path: &Path,
) -> bandcast_core::Result<()> {
    let args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        avi_path.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "fast".into(),
        "-crf".into(),
        "23".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "64k".into(),
        "-f".into(),
        "mp4".into(),
        mp4_path.to_string_lossy().into_owned(),
    ];

    run_and_verify(engine, &args, mp4_path).await
}

/// Render the first three seconds of a produced AVI as a looping GIF.
pub async fn gif_preview(
    engine: &dyn TranscodeEngine,
    avi_path: &Path,
    gif_path: &Path,
) -> bandcast_core::Result<()> {
    let args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        avi_path.to_string_lossy().into_owned(),
        "-t".into(),
        "3".into(),
        "-vf".into(),
        "fps=2,scale=200:-1".into(),
        "-loop".into(),
        "0".into(),
        gif_path.to_string_lossy().into_owned(),
    ];

    run_and_verify(engine, &args, gif_path).await
}

/// Extract a single frame at `at_secs` as an image (format from extension).
pub async fn extract_frame(
    engine: &dyn TranscodeEngine,
    source_path: &Path,
    at_secs: f64,
    frame_path: &Path,
) -> bandcast_core::Result<()> {
    let args: Vec<String> = vec![
        "-y".into(),
        "-ss".into(),
        at_secs.to_string(),
        "-i".into(),
        source_path.to_string_lossy().into_owned(),
        "-frames:v".into(),
        "1".into(),
        "-q:v".into(),
        "3".into(),
        frame_path.to_string_lossy().into_owned(),
    ];

    run_and_verify(engine, &args, frame_path).await
}

/// Run the engine and confirm it left a non-empty file behind.
async fn run_and_verify(
    engine: &dyn TranscodeEngine,
    args: &[String],
    output: &Path,
) -> bandcast_core::Result<()> {
    let report = engine.run(args).await?;
    if !report.success {
        return Err(bandcast_core::Error::Tool {
            tool: engine.name().to_string(),
            message: report.diagnostic,
        });
    }

    let meta = tokio::fs::metadata(output).await.map_err(|e| {
        bandcast_core::Error::Io {
            source: std::io::Error::new(
                e.kind(),
                format!("output missing after conversion: {}", output.display()),
            ),
        }
    })?;
    if meta.len() == 0 {
        return Err(bandcast_core::Error::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("output empty after conversion: {}", output.display()),
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EngineReport;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Engine that records the args it was given and optionally writes the
    /// output file named by the last argument.
    struct RecordingEngine {
        calls: Mutex<Vec<Vec<String>>>,
        write_output: bool,
        succeed: bool,
    }

    #[async_trait]
    impl TranscodeEngine for RecordingEngine {
        async fn run(&self, args: &[String]) -> bandcast_core::Result<EngineReport> {
            self.calls.lock().unwrap().push(args.to_vec());
            if self.write_output && self.succeed {
                let out = args.last().unwrap();
                std::fs::write(out, b"data").unwrap();
            }
            Ok(EngineReport {
                success: self.succeed,
                diagnostic: if self.succeed {
                    String::new()
                } else {
                    "conversion failed".into()
                },
            })
        }
    }

    #[tokio::test]
    async fn mp4_args_carry_the_playback_codec() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("preview.mp4");
        let engine = RecordingEngine {
            calls: Mutex::new(Vec::new()),
            write_output: true,
            succeed: true,
        };

        remux_to_mp4(&engine, Path::new("/in/clip.avi"), &out)
            .await
            .unwrap();

        let calls = engine.calls.lock().unwrap();
        let args = &calls[0];
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert_eq!(args.last().unwrap(), &out.to_string_lossy());
    }

    #[tokio::test]
    async fn gif_preview_limits_length_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("preview.gif");
        let engine = RecordingEngine {
            calls: Mutex::new(Vec::new()),
            write_output: true,
            succeed: true,
        };

        gif_preview(&engine, Path::new("/in/clip.avi"), &out)
            .await
            .unwrap();

        let calls = engine.calls.lock().unwrap();
        let args = &calls[0];
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "3");
        assert!(args.contains(&"fps=2,scale=200:-1".to_string()));
    }

    #[tokio::test]
    async fn engine_failure_surfaces_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frame.png");
        let engine = RecordingEngine {
            calls: Mutex::new(Vec::new()),
            write_output: false,
            succeed: false,
        };

        let err = extract_frame(&engine, Path::new("/in/clip.mp4"), 1.0, &out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("conversion failed"));
    }

    #[tokio::test]
    async fn missing_output_after_success_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("preview.mp4");
        let engine = RecordingEngine {
            calls: Mutex::new(Vec::new()),
            write_output: false,
            succeed: true,
        };

        let err = remux_to_mp4(&engine, Path::new("/in/clip.avi"), &out)
            .await
            .unwrap_err();
        assert!(matches!(err, bandcast_core::Error::Io { .. }));
    }
}
