//! Compilation assembly: one ffmpeg filter graph for all selected clips.
//!
//! Every clip becomes its own input. Video is trimmed, re-timed and
//! letterboxed to the target resolution; audio is trimmed and re-timed; the
//! pairs are then concatenated in order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::CoreError;
use crate::selection::TimeSlice;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default output resolution of a compilation.
pub const DEFAULT_RESOLUTION: &str = "1920x1080";

/// Prefix of every compilation file name.
pub const COMPILATION_PREFIX: &str = "collage";

/// Length of the random suffix that keeps same-minute compilations apart.
pub const COMPILATION_SUFFIX_LEN: usize = 6;

/// Encoder settings appended after the filter graph.
pub const ENCODE_ARGS: &[&str] = &[
    "-c:v",
    "libx264",
    "-crf",
    "21",
    "-profile:v",
    "baseline",
    "-level",
    "3.0",
    "-c:a",
    "aac",
    "-b:a",
    "160k",
];

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Parse a resolution string like `"1920x1080"`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return Err(CoreError::Validation(format!(
                "Invalid resolution format '{s}': expected WIDTHxHEIGHT"
            )));
        }
        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| CoreError::Validation(format!("Invalid width in resolution '{s}'")))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| CoreError::Validation(format!("Invalid height in resolution '{s}'")))?;
        if width == 0 || height == 0 {
            return Err(CoreError::Validation(format!(
                "Resolution dimensions must be > 0, got '{s}'"
            )));
        }
        Ok(Self { width, height })
    }

    /// Scale-and-pad chain that fits any input inside this frame.
    pub fn scale_filter(&self) -> String {
        let Self { width: w, height: h } = *self;
        format!("{w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2")
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Filter graph
// ---------------------------------------------------------------------------

/// One clip of a compilation, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyClip {
    pub source: PathBuf,
    pub slice: TimeSlice,
}

/// Inputs plus the `-filter_complex` expression joining them.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub inputs: Vec<PathBuf>,
    pub filter_complex: String,
}

/// Build the filter graph concatenating `clips` in order.
pub fn build_filter_graph(clips: &[AssemblyClip], resolution: Resolution) -> FilterGraph {
    let scale = resolution.scale_filter();
    let mut split = String::new();
    let mut join = String::new();

    for (i, clip) in clips.iter().enumerate() {
        let start = clip.slice.start;
        let end = clip.slice.end;
        split.push_str(&format!(
            "[{i}:v:0]trim={start:.3}:{end:.3},setpts=PTS-STARTPTS,scale={scale}[v{i}];"
        ));
        split.push_str(&format!(
            "[{i}:a:0]atrim={start:.3}:{end:.3},asetpts=PTS-STARTPTS[a{i}];"
        ));
        join.push_str(&format!("[v{i}][a{i}]"));
    }

    FilterGraph {
        inputs: clips.iter().map(|c| c.source.clone()).collect(),
        filter_complex: format!("{split}{join}concat=n={}:v=1:a=1[outv][outa]", clips.len()),
    }
}

impl FilterGraph {
    /// Full ffmpeg argument list writing the compilation to `output`.
    pub fn ffmpeg_args(&self, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.clone().into_os_string());
        }
        args.push("-filter_complex".into());
        args.push(self.filter_complex.clone().into());
        for map in ["[outv]", "[outa]"] {
            args.push("-map".into());
            args.push(map.into());
        }
        args.extend(ENCODE_ARGS.iter().map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// File name for a compilation made at `now`, e.g.
/// `collage-202601151230-qwerty.mp4`.
pub fn compilation_file_name<R: Rng + ?Sized>(now: Timestamp, rng: &mut R) -> String {
    let suffix: String = (0..COMPILATION_SUFFIX_LEN)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect();
    format!(
        "{COMPILATION_PREFIX}-{}-{suffix}.mp4",
        now.format("%Y%m%d%H%M")
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    // -- Resolution parsing --

    #[test]
    fn parse_resolution_valid() {
        assert_eq!(
            Resolution::parse("1920x1080").unwrap(),
            Resolution { width: 1920, height: 1080 }
        );
    }

    #[test]
    fn parse_resolution_invalid_format() {
        assert!(Resolution::parse("1920-1080").is_err());
        assert!(Resolution::parse("abcxdef").is_err());
        assert!(Resolution::parse("0x1080").is_err());
    }

    #[test]
    fn scale_filter_letterboxes() {
        let r = Resolution::parse("1280x720").unwrap();
        assert_eq!(
            r.scale_filter(),
            "1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2"
        );
    }

    // -- Filter graph --

    #[test]
    fn filter_graph_for_two_clips() {
        let clips = vec![
            AssemblyClip {
                source: PathBuf::from("/raw/a/a.mp4"),
                slice: TimeSlice::new(10.0, 32.5),
            },
            AssemblyClip {
                source: PathBuf::from("/raw/b/b.mp4"),
                slice: TimeSlice::new(100.25, 130.0),
            },
        ];
        let graph = build_filter_graph(&clips, Resolution { width: 640, height: 360 });
        let scale = "640:360:force_original_aspect_ratio=decrease,pad=640:360:(ow-iw)/2:(oh-ih)/2";
        let expected = format!(
            "[0:v:0]trim=10.000:32.500,setpts=PTS-STARTPTS,scale={scale}[v0];\
             [0:a:0]atrim=10.000:32.500,asetpts=PTS-STARTPTS[a0];\
             [1:v:0]trim=100.250:130.000,setpts=PTS-STARTPTS,scale={scale}[v1];\
             [1:a:0]atrim=100.250:130.000,asetpts=PTS-STARTPTS[a1];\
             [v0][a0][v1][a1]concat=n=2:v=1:a=1[outv][outa]"
        );
        assert_eq!(graph.filter_complex, expected);
        assert_eq!(graph.inputs.len(), 2);
    }

    #[test]
    fn ffmpeg_args_list_inputs_then_encoder() {
        let clips = vec![AssemblyClip {
            source: PathBuf::from("/raw/a/a.mp4"),
            slice: TimeSlice::new(0.0, 5.0),
        }];
        let graph = build_filter_graph(&clips, Resolution { width: 640, height: 360 });
        let args = graph.ffmpeg_args(Path::new("collage/out.mp4"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[..2], &["-i", "/raw/a/a.mp4"]);
        assert_eq!(args[2], "-filter_complex");
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "collage/out.mp4");
    }

    // -- Naming --

    #[test]
    fn compilation_name_has_minute_stamp_and_suffix() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let name = compilation_file_name(now, &mut StdRng::seed_from_u64(1));
        assert!(name.starts_with("collage-202601151230-"));
        assert!(name.ends_with(".mp4"));
        let suffix = &name["collage-202601151230-".len()..name.len() - 4];
        assert_eq!(suffix.len(), COMPILATION_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }
}
