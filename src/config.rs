use crate::error::{Result, SegError};
use crate::output::{FourCc, DEFAULT_FPS};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Overlay semantic segmentation masks on a video", long_about = None)]
pub struct Args {
    /// Path to the segmentation model (ONNX file)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Path to the class names file, one per line
    #[arg(short, long)]
    pub classes: PathBuf,

    /// Input video path
    #[arg(short, long)]
    pub video: PathBuf,

    /// Output video path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Display frames while processing (0 disables)
    #[arg(short, long, default_value_t = 1)]
    pub show: i32,

    /// Path to the class colors file, one `R,G,B` per line
    #[arg(short = 'l', long)]
    pub colors: Option<PathBuf>,

    /// Width frames are resized to before inference
    #[arg(short, long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Output frame rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: f64,

    /// Output codec four-character tag
    #[arg(long, default_value = "MJPG")]
    pub codec: FourCc,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Validated run configuration, built once and shared read-only by every stage.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model_path: PathBuf,
    pub classes_path: PathBuf,
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub colors_path: Option<PathBuf>,
    pub show: bool,
    pub working_width: u32,
    pub fps: f64,
    pub codec: FourCc,
}

impl Settings {
    /// Defaults for everything but the four required paths.
    pub fn new(
        model_path: impl Into<PathBuf>,
        classes_path: impl Into<PathBuf>,
        video_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            classes_path: classes_path.into(),
            video_path: video_path.into(),
            output_path: output_path.into(),
            colors_path: None,
            show: true,
            working_width: 500,
            fps: DEFAULT_FPS,
            codec: FourCc::default(),
        }
    }

    /// Check that input files exist and numeric options are usable.
    pub fn validate(&self) -> Result<()> {
        require_file("model", &self.model_path)?;
        require_file("classes file", &self.classes_path)?;
        require_file("video", &self.video_path)?;
        if let Some(colors) = &self.colors_path {
            require_file("colors file", colors)?;
        }
        if self.working_width == 0 {
            return Err(SegError::config("width must be positive"));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(SegError::config(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        Ok(())
    }
}

impl TryFrom<Args> for Settings {
    type Error = SegError;

    fn try_from(args: Args) -> Result<Self> {
        let settings = Self {
            model_path: args.model,
            classes_path: args.classes,
            video_path: args.video,
            output_path: args.output,
            colors_path: args.colors,
            show: args.show > 0,
            working_width: args.width,
            fps: args.fps,
            codec: args.codec,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn require_file(what: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SegError::config(format!(
            "{what} {} does not exist",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn parses_short_flags_with_defaults() {
        let args = Args::try_parse_from([
            "segvid", "-m", "enet.onnx", "-c", "classes.txt", "-v", "in.mp4", "-o", "out.avi",
        ])
        .unwrap();
        assert_eq!(args.show, 1);
        assert_eq!(args.width, 500);
        assert_eq!(args.fps, 30.0);
        assert_eq!(args.codec, FourCc::default());
        assert!(args.colors.is_none());
    }

    #[test]
    fn parses_optional_flags() {
        let args = Args::try_parse_from([
            "segvid", "--model", "m", "--classes", "c", "--video", "v", "--output", "o", "-s",
            "0", "-l", "colors.txt", "-w", "640", "--codec", "mp4v",
        ])
        .unwrap();
        assert_eq!(args.show, 0);
        assert_eq!(args.colors, Some(PathBuf::from("colors.txt")));
        assert_eq!(args.width, 640);
        assert_eq!(args.codec.to_string(), "mp4v");
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        assert!(Args::try_parse_from(["segvid", "-m", "m", "-c", "c", "-v", "v"]).is_err());
    }

    #[test]
    fn zero_width_and_bad_codec_are_rejected_by_parser() {
        let base = ["segvid", "-m", "m", "-c", "c", "-v", "v", "-o", "o"];
        let with = |extra: &[&str]| {
            let mut argv = base.to_vec();
            argv.extend_from_slice(extra);
            Args::try_parse_from(argv)
        };
        assert!(with(&["-w", "0"]).is_err());
        assert!(with(&["--codec", "H264X"]).is_err());
    }

    #[test]
    fn settings_from_args_checks_inputs() {
        let dir = TempDir::new().unwrap();
        let model = touch(&dir, "model.onnx");
        let classes = touch(&dir, "classes.txt");
        let video = touch(&dir, "in.mp4");
        let output = dir.path().join("out.avi");

        let mut args = Args::try_parse_from([
            "segvid",
            "-m",
            model.to_str().unwrap(),
            "-c",
            classes.to_str().unwrap(),
            "-v",
            video.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-s",
            "0",
        ])
        .unwrap();

        let settings = Settings::try_from(args.clone()).unwrap();
        assert!(!settings.show);
        assert_eq!(settings.working_width, 500);

        args.colors = Some(dir.path().join("missing.txt"));
        assert!(matches!(
            Settings::try_from(args),
            Err(SegError::Config { .. })
        ));
    }

    #[test]
    fn non_positive_fps_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::new(
            touch(&dir, "m"),
            touch(&dir, "c"),
            touch(&dir, "v"),
            dir.path().join("o"),
        );
        settings.fps = 0.0;
        assert!(settings.validate().is_err());
    }
}
