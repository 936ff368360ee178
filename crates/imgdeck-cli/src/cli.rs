//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use imgdeck_core::TargetFormat;

#[derive(Debug, Parser)]
#[command(name = "imgdeck", version, about = "Browse folders of images and batch-edit them")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results and notifications as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the folders and images in a directory.
    Ls(LsArgs),
    /// List mount points and the desktop.
    Roots,
    /// Show size, dates and dimensions of a file or folder.
    Info { path: PathBuf },
    /// Rename a file or folder in place.
    Rename { path: PathBuf, new_name: String },
    /// Permanently delete files or folders.
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Write compressed copies of images.
    Compress {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// 1-100; defaults to the configured quality.
        #[arg(short, long)]
        quality: Option<u8>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write copies of images in another format.
    Convert {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// jpeg, png, webp, bmp, gif or tiff.
        #[arg(short, long)]
        format: TargetFormat,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write cropped copies of images.
    Crop {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, default_value_t = 0)]
        x: u32,
        #[arg(long, default_value_t = 0)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write copies of images with a text watermark.
    Watermark(WatermarkArgs),
    /// List a directory and re-list it whenever it changes.
    Watch { path: Option<PathBuf> },
}

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Directory to list; defaults to the configured start directory.
    pub path: Option<PathBuf>,

    /// Resolve thumbnail URLs for images.
    #[arg(long)]
    pub previews: bool,

    /// Only print the items a grid of this width would render.
    #[arg(long, requires = "height")]
    pub width: Option<f64>,

    #[arg(long, requires = "width")]
    pub height: Option<f64>,

    /// Scroll offset of the grid, in pixels.
    #[arg(long, default_value_t = 0.0)]
    pub scroll: f64,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Directory to write into; defaults to the configured output directory,
    /// then to the source directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct WatermarkArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Up to 10 characters.
    #[arg(short, long)]
    pub text: String,

    #[arg(long)]
    pub font_size: Option<u32>,

    /// Colour name, #hex or rgba(); defaults to the configured colour.
    #[arg(long)]
    pub color: Option<String>,

    /// Clockwise rotation in degrees.
    #[arg(long)]
    pub angle: Option<f32>,

    /// Horizontal anchor, 0-100.
    #[arg(long)]
    pub x_percent: Option<f64>,

    /// Vertical anchor, 0-100.
    #[arg(long)]
    pub y_percent: Option<f64>,

    /// Print where the watermark would land instead of writing files.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compress_with_quality() {
        let cli = Cli::parse_from(["imgdeck", "compress", "a.jpg", "b.jpg", "-q", "60"]);
        match cli.command {
            CliCommand::Compress { paths, quality, output } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(quality, Some(60));
                assert!(output.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_convert_format() {
        let cli = Cli::parse_from(["imgdeck", "convert", "a.png", "--format", "jpg"]);
        assert!(matches!(
            cli.command,
            CliCommand::Convert {
                format: TargetFormat::Jpeg,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_format() {
        let result = Cli::try_parse_from(["imgdeck", "convert", "a.png", "--format", "psd"]);
        assert!(result.is_err());
    }

    #[test]
    fn ls_viewport_needs_both_sizes() {
        assert!(Cli::try_parse_from(["imgdeck", "ls", "--width", "800"]).is_err());
        let cli = Cli::try_parse_from(["imgdeck", "ls", "--width", "800", "--height", "600"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["imgdeck", "roots", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, CliCommand::Roots));
    }

    #[test]
    fn delete_requires_paths() {
        assert!(Cli::try_parse_from(["imgdeck", "delete"]).is_err());
    }
}
