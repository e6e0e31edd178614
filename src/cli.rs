use livecap::client::OutputMode;
use livecap::i18n::Language;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "livecap")]
#[command(about = "Caption a video through a transcription server and play the captions live")]
pub struct Cli {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a config TOML. Defaults to ./livecap.toml if present."
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Override the log level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a subtitle track and print it back as normalised WebVTT
    Parse(ParseCmd),
    /// Play a local subtitle track in the terminal.
    ///
    /// While playing, type `c` to toggle captions, `p` to pause or resume
    /// and `s <secs>` to seek.
    Play(PlayCmd),
    /// Upload a video, transcribe it and play the captions (same controls as `play`)
    Caption(CaptionCmd),
    /// Download the captioned render of an uploaded video
    Render(RenderCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct ParseCmd {
    #[arg(
        value_name = "FILE",
        help = "The track to read from, or '-' for standard input.",
        default_value = "-"
    )]
    pub input: String,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. If not supplied, the track is written to standard output."
    )]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct PlayCmd {
    #[arg(value_name = "FILE")]
    pub track: PathBuf,

    #[arg(
        long,
        value_name = "SECS",
        help = "Stop after this many seconds of playback. Defaults to the end of the last cue."
    )]
    pub duration: Option<f64>,

    #[arg(long, help = "Start with captions switched off.")]
    pub captions_off: bool,
}

#[derive(Debug, Parser)]
pub struct CaptionCmd {
    #[arg(long, value_name = "FILE")]
    pub video: PathBuf,

    #[arg(long, value_enum, help = "Which text the track should contain.")]
    pub output_mode: Option<OutputMode>,

    #[arg(long, help = "Spoken language of the video, e.g. 'ar'.")]
    pub language: Option<String>,

    #[arg(long, value_enum, help = "Language of status messages.")]
    pub ui_language: Option<Language>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Stop after this many seconds of playback. Defaults to the end of the last cue."
    )]
    pub duration: Option<f64>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Also download the captioned render to this file."
    )]
    pub render_to: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct RenderCmd {
    #[arg(long, help = "Identifier returned by a previous upload.")]
    pub id: String,

    #[arg(long, value_name = "FILE")]
    pub dest: PathBuf,
}
