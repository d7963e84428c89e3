//! FFmpeg/FFprobe command utilities.
//!
//! [`MediaTools`] is the seam between the curation pipeline and the
//! external transcoder: probing a movie, extracting one still frame and
//! encoding a compilation. [`Ffmpeg`] implements it by shelling out.

use std::ffi::OsString;
use std::path::Path;

use serde::Deserialize;

use crate::format::VideoStats;
use crate::types::Seconds;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: Option<FfprobeFormat>,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// External media operations used by the pipeline.
pub trait MediaTools: Send + Sync {
    /// Duration and frame size of the primary video stream.
    fn probe(
        &self,
        video: &Path,
    ) -> impl std::future::Future<Output = Result<VideoStats, FfmpegError>> + Send;

    /// Write the left eye of the frame at `timestamp` to `output`.
    fn extract_frame(
        &self,
        video: &Path,
        timestamp: Seconds,
        orientation: &str,
        output: &Path,
    ) -> impl std::future::Future<Output = Result<(), FfmpegError>> + Send;

    /// Run one ffmpeg invocation with the given arguments.
    fn encode(
        &self,
        args: &[OsString],
    ) -> impl std::future::Future<Output = Result<(), FfmpegError>> + Send;
}

/// [`MediaTools`] backed by the `ffmpeg` and `ffprobe` binaries on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ffmpeg;

impl MediaTools for Ffmpeg {
    async fn probe(&self, video: &Path) -> Result<VideoStats, FfmpegError> {
        let probe = probe_video(video).await?;
        video_stats(&probe)
    }

    async fn extract_frame(
        &self,
        video: &Path,
        timestamp: Seconds,
        orientation: &str,
        output: &Path,
    ) -> Result<(), FfmpegError> {
        extract_frame(video, timestamp, orientation, output).await
    }

    async fn encode(&self, args: &[OsString]) -> Result<(), FfmpegError> {
        run_ffmpeg(args).await
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&stdout)
}

/// Parse raw ffprobe JSON.
pub fn parse_probe_output(stdout: &str) -> Result<FfprobeOutput, FfmpegError> {
    serde_json::from_str::<FfprobeOutput>(stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Video filter that keeps the left eye of a stereo frame.
pub fn stereo_filter(orientation: &str) -> String {
    format!("stereo3d={orientation}l:ml")
}

/// Extract a single frame as a JPEG at the given timestamp.
///
/// Seeking with `-ss` before `-i` per frame is slower than the `fps` filter
/// but makes the timestamp of every thumbnail exact.
pub async fn extract_frame(
    video_path: &Path,
    timestamp_secs: Seconds,
    orientation: &str,
    output_path: &Path,
) -> Result<(), FfmpegError> {
    if !video_path.exists() {
        return Err(FfmpegError::VideoNotFound(
            video_path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
        .arg(video_path)
        .args(["-vf", &stereo_filter(orientation), "-vframes", "1"])
        .arg(output_path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Run `ffmpeg` with a prepared argument list.
pub async fn run_ffmpeg(args: &[OsString]) -> Result<(), FfmpegError> {
    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-v", "error"])
        .args(args)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds.
///
/// The video stream's own duration wins over the container's, since audio
/// tracks may run longer than the picture.
pub fn parse_duration(probe: &FfprobeOutput) -> Option<Seconds> {
    let from_stream = first_video_stream(probe)
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let from_format = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    from_stream.or(from_format)
}

/// Duration and frame size of the first video stream.
pub fn video_stats(probe: &FfprobeOutput) -> Result<VideoStats, FfmpegError> {
    let stream = first_video_stream(probe)
        .ok_or_else(|| FfmpegError::ParseError("no video stream".to_string()))?;
    let duration = parse_duration(probe)
        .ok_or_else(|| FfmpegError::ParseError("unable to parse the video duration".to_string()))?;
    Ok(VideoStats {
        duration,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PROBE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "audio", "duration": "3605.2"},
            {"index": 1, "codec_type": "video", "width": 5760, "height": 2880, "duration": "3600.0"}
        ],
        "format": {"duration": "3605.2", "size": "123"}
    }"#;

    #[test]
    fn stats_come_from_video_stream() {
        let probe = parse_probe_output(PROBE).unwrap();
        let stats = video_stats(&probe).unwrap();
        assert!((stats.duration - 3600.0).abs() < 0.001);
        assert_eq!((stats.width, stats.height), (5760, 2880));
    }

    #[test]
    fn duration_falls_back_to_format() {
        let probe = parse_probe_output(
            r#"{"streams": [{"codec_type": "video", "width": 10, "height": 10}],
                "format": {"duration": "42.5"}}"#,
        )
        .unwrap();
        assert_eq!(parse_duration(&probe), Some(42.5));
    }

    #[test]
    fn missing_video_stream_is_an_error() {
        let probe = parse_probe_output(r#"{"streams": [{"codec_type": "audio"}]}"#).unwrap();
        assert_matches!(video_stats(&probe), Err(FfmpegError::ParseError(_)));
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        assert_matches!(parse_probe_output("not json"), Err(FfmpegError::ParseError(_)));
    }

    #[test]
    fn stereo_filter_takes_left_eye() {
        assert_eq!(stereo_filter("sbs"), "stereo3d=sbsl:ml");
        assert_eq!(stereo_filter("ab"), "stereo3d=abl:ml");
    }

    #[tokio::test]
    async fn probe_missing_file_is_reported() {
        let result = probe_video(Path::new("/nonexistent/movie.mp4")).await;
        assert_matches!(result, Err(FfmpegError::VideoNotFound(_)));
    }
}
