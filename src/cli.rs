//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, value parser helpers, and
//! the subcommand definitions for the `dreamgen` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::luma::{ImageRef, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};

// ==================== Value Parsers ====================

/// Parse and validate an aspect ratio (W:H format, e.g. 16:9)
pub fn parse_aspect_ratio(s: &str) -> Result<String, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid aspect ratio '{}'. Use W:H (e.g., 16:9)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in aspect ratio", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in aspect ratio", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Aspect ratio terms must be greater than 0".to_string());
    }
    Ok(s.to_string())
}

/// Parse and validate a resolution preset
pub fn parse_resolution(s: &str) -> Result<String, String> {
    const ALLOWED: &[&str] = &["540p", "720p", "1080p", "4k"];
    if ALLOWED.contains(&s) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Unknown resolution '{}'. Available: {}",
            s,
            ALLOWED.join(", ")
        ))
    }
}

/// Parse and validate a duration ("Ns" format, e.g. 9s)
pub fn parse_duration(s: &str) -> Result<String, String> {
    let secs = s
        .strip_suffix('s')
        .ok_or_else(|| format!("Invalid duration '{}'. Use Ns (e.g., 9s)", s))?;
    let secs: u32 = secs
        .parse()
        .map_err(|_| format!("Invalid duration '{}'. Use Ns (e.g., 9s)", s))?;
    if !(1..=30).contains(&secs) {
        return Err(format!(
            "Duration must be between 1s and 30s, got {}s",
            secs
        ));
    }
    Ok(s.to_string())
}

/// Parse a reference image: URL or URL@WEIGHT (weight 0.0-1.0)
///
/// The part after the last `@` is treated as a weight only when it parses as
/// a number, so URLs containing `@` still work unweighted.
pub fn parse_image_ref(s: &str) -> Result<ImageRef, String> {
    if let Some((url, weight)) = s.rsplit_once('@') {
        if let Ok(weight) = weight.parse::<f64>() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!(
                    "Reference weight must be between 0.0 and 1.0, got {}",
                    weight
                ));
            }
            if url.is_empty() {
                return Err("Reference URL must not be empty".to_string());
            }
            return Ok(ImageRef::with_weight(url, weight));
        }
    }
    if s.is_empty() {
        return Err("Reference URL must not be empty".to_string());
    }
    Ok(ImageRef::new(s))
}

/// Parse a character reference: NAME=URL (e.g. identity0=https://...)
pub fn parse_character_ref(s: &str) -> Result<(String, String), String> {
    let (name, url) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid character reference '{}'. Use NAME=URL", s))?;
    if name.is_empty() || url.is_empty() {
        return Err(format!("Invalid character reference '{}'. Use NAME=URL", s));
    }
    Ok((name.to_string(), url.to_string()))
}

/// Parse a keyframe: LABEL=URL where LABEL is frame0 or frame1
pub fn parse_keyframe(s: &str) -> Result<(String, String), String> {
    let (label, url) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid keyframe '{}'. Use LABEL=URL", s))?;
    if label != "frame0" && label != "frame1" {
        return Err(format!(
            "Unknown keyframe label '{}'. Available labels: frame0, frame1",
            label
        ));
    }
    if url.is_empty() {
        return Err("Keyframe URL must not be empty".to_string());
    }
    Ok((label.to_string(), url.to_string()))
}

// ==================== CLI Arguments ====================

/// CLI for generating images and videos with the Luma Dream Machine API
#[derive(Parser, Debug)]
#[command(name = "dreamgen")]
#[command(version, about = "Generate images and videos with the Dream Machine API", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

/// Options shared by the image and video subcommands.
#[derive(clap::Args, Debug)]
pub struct GenerateOpts {
    /// Text prompt describing the output
    pub prompt: String,

    /// Aspect ratio (e.g. 16:9, 9:16)
    #[arg(long, value_parser = parse_aspect_ratio, value_name = "W:H")]
    pub aspect_ratio: Option<String>,

    /// Output resolution (540p, 720p, 1080p, 4k)
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<String>,

    /// Composition reference image: URL or URL@WEIGHT (repeatable)
    #[arg(long = "image-ref", value_parser = parse_image_ref, value_name = "URL[@WEIGHT]")]
    pub image_refs: Vec<ImageRef>,

    /// Style reference image: URL or URL@WEIGHT (repeatable)
    #[arg(long = "style-ref", value_parser = parse_image_ref, value_name = "URL[@WEIGHT]")]
    pub style_refs: Vec<ImageRef>,

    /// Character reference image: NAME=URL (repeatable; same NAME accumulates)
    #[arg(long = "character-ref", value_parser = parse_character_ref, value_name = "NAME=URL")]
    pub character_refs: Vec<(String, String)>,

    /// Directory for the downloaded asset (default: generations/)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds between status checks (default: 3)
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Give up after this many seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an image and download it as <id>.jpg
    Image {
        #[command(flatten)]
        opts: GenerateOpts,

        /// Model to use
        #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
        model: String,
    },
    /// Generate a video and download it as <id>.mp4
    Video {
        #[command(flatten)]
        opts: GenerateOpts,

        /// Model to use
        #[arg(long, default_value = DEFAULT_VIDEO_MODEL)]
        model: String,

        /// Video duration (e.g. 5s, 9s)
        #[arg(long, value_parser = parse_duration, value_name = "Ns")]
        duration: Option<String>,

        /// Force the video to loop (start and end frames match)
        #[arg(long = "loop")]
        loop_video: bool,

        /// Keyframe image: LABEL=URL where LABEL is frame0 or frame1 (repeatable)
        #[arg(long = "keyframe", value_parser = parse_keyframe, value_name = "LABEL=URL")]
        keyframes: Vec<(String, String)>,
    },
    /// List camera-motion concepts the API accepts in prompts
    Concepts,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Value Parser Tests ====================

    #[test]
    fn test_parse_aspect_ratio_valid() {
        assert_eq!(parse_aspect_ratio("16:9").unwrap(), "16:9");
        assert_eq!(parse_aspect_ratio("9:16").unwrap(), "9:16");
        assert_eq!(parse_aspect_ratio("1:1").unwrap(), "1:1");
    }

    #[test]
    fn test_parse_aspect_ratio_invalid() {
        assert!(parse_aspect_ratio("16x9").is_err());
        assert!(parse_aspect_ratio("16:").is_err());
        assert!(parse_aspect_ratio("0:9").is_err());
        assert!(parse_aspect_ratio("wide").is_err());
    }

    #[test]
    fn test_parse_resolution_valid() {
        assert_eq!(parse_resolution("1080p").unwrap(), "1080p");
        assert_eq!(parse_resolution("4k").unwrap(), "4k");
    }

    #[test]
    fn test_parse_resolution_invalid() {
        assert!(parse_resolution("8k").is_err());
        assert!(parse_resolution("1080").is_err());
    }

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("5s").unwrap(), "5s");
        assert_eq!(parse_duration("9s").unwrap(), "9s");
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("9").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("31s").is_err());
        assert!(parse_duration("forever").is_err());
    }

    #[test]
    fn test_parse_image_ref_with_weight() {
        let r = parse_image_ref("https://example.com/pose.png@0.45").unwrap();
        assert_eq!(r.url, "https://example.com/pose.png");
        assert_eq!(r.weight, Some(0.45));
    }

    #[test]
    fn test_parse_image_ref_without_weight() {
        let r = parse_image_ref("https://example.com/pose.png").unwrap();
        assert_eq!(r.url, "https://example.com/pose.png");
        assert_eq!(r.weight, None);
    }

    #[test]
    fn test_parse_image_ref_url_containing_at_sign() {
        let r = parse_image_ref("https://user@example.com/pose.png").unwrap();
        assert_eq!(r.url, "https://user@example.com/pose.png");
        assert_eq!(r.weight, None);
    }

    #[test]
    fn test_parse_image_ref_out_of_range_weight() {
        assert!(parse_image_ref("https://example.com/a.png@1.5").is_err());
        assert!(parse_image_ref("https://example.com/a.png@-0.1").is_err());
    }

    #[test]
    fn test_parse_character_ref_valid() {
        let (name, url) = parse_character_ref("identity0=https://example.com/face.png").unwrap();
        assert_eq!(name, "identity0");
        assert_eq!(url, "https://example.com/face.png");
    }

    #[test]
    fn test_parse_character_ref_invalid() {
        assert!(parse_character_ref("identity0").is_err());
        assert!(parse_character_ref("=https://example.com/face.png").is_err());
        assert!(parse_character_ref("identity0=").is_err());
    }

    #[test]
    fn test_parse_keyframe_valid() {
        let (label, url) = parse_keyframe("frame0=https://example.com/pose.png").unwrap();
        assert_eq!(label, "frame0");
        assert_eq!(url, "https://example.com/pose.png");

        let (label, _) = parse_keyframe("frame1=https://example.com/end.png").unwrap();
        assert_eq!(label, "frame1");
    }

    #[test]
    fn test_parse_keyframe_invalid_label() {
        assert!(parse_keyframe("frame2=https://example.com/a.png").is_err());
        assert!(parse_keyframe("start=https://example.com/a.png").is_err());
    }

    // ==================== CLI Parsing Tests ====================

    #[test]
    fn test_args_image_defaults() {
        let args = Args::parse_from(["dreamgen", "image", "a bronze statue"]);
        match args.command {
            Command::Image { opts, model } => {
                assert_eq!(opts.prompt, "a bronze statue");
                assert_eq!(model, DEFAULT_IMAGE_MODEL);
                assert!(opts.aspect_ratio.is_none());
                assert!(opts.image_refs.is_empty());
                assert!(opts.output_dir.is_none());
                assert!(opts.poll_interval.is_none());
                assert!(opts.timeout.is_none());
            }
            _ => panic!("Expected Image subcommand"),
        }
    }

    #[test]
    fn test_args_video_with_keyframes_and_loop() {
        let args = Args::parse_from([
            "dreamgen",
            "video",
            "orbit left",
            "--duration",
            "9s",
            "--loop",
            "--keyframe",
            "frame0=https://example.com/pose.png",
            "--keyframe",
            "frame1=https://example.com/end.png",
        ]);
        match args.command {
            Command::Video {
                opts,
                model,
                duration,
                loop_video,
                keyframes,
            } => {
                assert_eq!(opts.prompt, "orbit left");
                assert_eq!(model, DEFAULT_VIDEO_MODEL);
                assert_eq!(duration, Some("9s".to_string()));
                assert!(loop_video);
                assert_eq!(keyframes.len(), 2);
                assert_eq!(keyframes[0].0, "frame0");
                assert_eq!(keyframes[1].0, "frame1");
            }
            _ => panic!("Expected Video subcommand"),
        }
    }

    #[test]
    fn test_args_image_with_references() {
        let args = Args::parse_from([
            "dreamgen",
            "image",
            "a pharaoh",
            "--aspect-ratio",
            "9:16",
            "--image-ref",
            "https://example.com/pose.png@0.45",
            "--character-ref",
            "identity0=https://example.com/face.png",
        ]);
        match args.command {
            Command::Image { opts, .. } => {
                assert_eq!(opts.aspect_ratio, Some("9:16".to_string()));
                assert_eq!(opts.image_refs.len(), 1);
                assert_eq!(opts.image_refs[0].weight, Some(0.45));
                assert_eq!(opts.character_refs.len(), 1);
            }
            _ => panic!("Expected Image subcommand"),
        }
    }

    #[test]
    fn test_args_concepts_subcommand() {
        let args = Args::parse_from(["dreamgen", "concepts"]);
        assert!(matches!(args.command, Command::Concepts));
    }

    #[test]
    fn test_args_config_option() {
        let args = Args::parse_from(["dreamgen", "--config", "/tmp/config.toml", "concepts"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/config.toml")));
    }

    #[test]
    fn test_args_poll_options() {
        let args = Args::parse_from([
            "dreamgen",
            "video",
            "test",
            "--poll-interval",
            "5",
            "--timeout",
            "600",
            "--output-dir",
            "/tmp/renders",
        ]);
        match args.command {
            Command::Video { opts, .. } => {
                assert_eq!(opts.poll_interval, Some(5));
                assert_eq!(opts.timeout, Some(600));
                assert_eq!(opts.output_dir, Some(PathBuf::from("/tmp/renders")));
            }
            _ => panic!("Expected Video subcommand"),
        }
    }
}
