mod cli;

use crate::cli::{CaptionCmd, Cli, Command, ParseCmd, PlayCmd, RenderCmd};

use livecap::client::{ApiClient, CaptionService, VideoId};
use livecap::clock::{PlaybackClock, WallClock};
use livecap::config::{self, Config};
use livecap::controls;
use livecap::cue::Cue;
use livecap::parser::{ParsedTrack, Parser};
use livecap::player::{CaptionPlayer, CaptionToggle, TerminalSink};
use livecap::serialiser;
use livecap::session::{Session, Status};

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = Config::load(cli.config.as_deref())?;
    config::init_tracing(&cfg.logging, cli.log_level.as_deref())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "livecap starting");

    match cli.command {
        Command::Parse(cmd) => parse_track(cmd),
        Command::Play(cmd) => play_track(cmd, &cfg).await,
        Command::Caption(cmd) => caption_video(cmd, &cfg).await,
        Command::Render(cmd) => render(cmd, &cfg).await,
        Command::PrintDefaultConfig => {
            print!("{}", cfg.to_toml_pretty()?);
            Ok(())
        }
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).context(format!("Failed to open input file: '{}'", input))
    }
}

fn parse_logged(data: &str, source: &str) -> ParsedTrack {
    let track = Parser::new().parse(data);
    for skipped in &track.skipped {
        tracing::debug!(line = skipped.line_number, content = %skipped.content, "skipped");
    }
    if !track.skipped.is_empty() {
        tracing::warn!(
            source,
            skipped = track.skipped.len(),
            cues = track.cues.len(),
            "some lines could not be parsed"
        );
    }
    track
}

fn parse_track(cmd: ParseCmd) -> Result<()> {
    let data = read_input(&cmd.input)?;
    let track = parse_logged(&data, &cmd.input);

    match cmd.output {
        Some(path) => {
            let dst = std::fs::File::create(&path)
                .context(format!("Failed to create output file: '{}'", path.display()))?;
            serialiser::serialise(&track.cues, dst)?;
        }
        None => serialiser::serialise(&track.cues, io::stdout())?,
    }
    Ok(())
}

fn playback_length(cues: &[Cue], requested: Option<f64>) -> Result<Duration> {
    match requested {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|e| anyhow!("Invalid duration '{}': {}", secs, e)),
        None => Ok(cues.iter().map(Cue::end).max().unwrap_or_default()),
    }
}

/// Plays until `clock` reaches `until` or the user interrupts, applying
/// playback commands typed on stdin when `interactive` is set.
async fn play_until(
    clock: &WallClock,
    toggle: &CaptionToggle,
    until: Duration,
    tick: Duration,
    interactive: bool,
) {
    let mut commands = if interactive {
        eprintln!("controls: c = captions on/off, p = pause/resume, s <secs> = seek");
        Some(controls::spawn_stdin_reader())
    } else {
        None
    };

    loop {
        let remaining = until.saturating_sub(clock.current_time()) + tick;
        tokio::select! {
            _ = tokio::time::sleep(remaining), if !clock.is_paused() => {
                if clock.current_time() >= until {
                    tracing::info!("playback finished");
                    break;
                }
            }
            line = async { commands.as_mut()?.recv().await }, if commands.is_some() => match line {
                Some(line) => match controls::parse_command(&line) {
                    Some(Ok(command)) => eprintln!("{}", controls::apply(command, clock, toggle)),
                    Some(Err(message)) => eprintln!("! {}", message),
                    None => (),
                },
                None => commands = None,
            },
            res = tokio::signal::ctrl_c() => {
                match res {
                    Ok(()) => tracing::info!("playback interrupted"),
                    Err(err) => tracing::warn!(error = %err, "failed to listen for ctrl-c"),
                }
                break;
            }
        }
    }
}

async fn play_track(cmd: PlayCmd, cfg: &Config) -> Result<()> {
    let path = cmd.track.to_string_lossy().into_owned();
    let data = read_input(&path)?;
    let track = parse_logged(&data, &path);
    if track.cues.is_empty() {
        return Err(anyhow!("You appear to have supplied an empty track."));
    }
    let until = playback_length(&track.cues, cmd.duration)?;

    let clock = WallClock::start();
    let toggle = CaptionToggle::new(cfg.captions.enabled && !cmd.captions_off);
    let mut player = CaptionPlayer::new(
        Arc::new(clock.clone()),
        Arc::new(TerminalSink::new()),
        toggle.clone(),
        cfg.captions.poll_interval(),
    );
    player.start(track.cues);
    // A track read from stdin leaves nothing to read controls from.
    let interactive = path != "-";
    play_until(&clock, &toggle, until, cfg.captions.poll_interval(), interactive).await;
    Ok(())
}

fn report(status: &Status) {
    if status.ok {
        eprintln!("{}", status.text);
    } else {
        eprintln!("! {}", status.text);
    }
}

async fn caption_video(cmd: CaptionCmd, cfg: &Config) -> Result<()> {
    let client = ApiClient::new(&cfg.server.base_url)?;
    let ui_language = cmd.ui_language.unwrap_or(cfg.ui.language);

    let clock = WallClock::start();
    clock.pause();
    let player = CaptionPlayer::new(
        Arc::new(clock.clone()),
        Arc::new(TerminalSink::new()),
        CaptionToggle::new(cfg.captions.enabled),
        cfg.captions.poll_interval(),
    );
    let mut session = Session::new(client, player, ui_language);
    eprintln!("{}", session.labels().title);

    let uploaded = session.upload(&cmd.video).await;
    report(session.status());
    uploaded.context(format!("Failed to upload '{}'", cmd.video.display()))?;
    if let Some(url) = session.video_url()? {
        tracing::info!(%url, "video available");
    }

    let output = cmd.output_mode.unwrap_or(cfg.captions.output);
    let language = cmd
        .language
        .clone()
        .unwrap_or_else(|| cfg.captions.language.clone());
    let generated = session.generate_captions(output, &language).await;
    report(session.status());
    if generated.context("Failed to generate captions")?.unwrap_or(0) == 0 {
        tracing::warn!("the server returned a track without cues");
    }

    let until = playback_length(&session.player().cues(), cmd.duration)?;
    clock.seek(Duration::ZERO);
    clock.resume();
    let toggle = session.toggle().clone();
    play_until(&clock, &toggle, until, cfg.captions.poll_interval(), true).await;

    if let Some(dest) = &cmd.render_to {
        eprintln!("{}...", session.labels().download);
        let written = session
            .download_render(dest)
            .await
            .context(format!("Failed to download render to '{}'", dest.display()))?;
        if let Some(bytes) = written {
            eprintln!("{} bytes -> {}", bytes, dest.display());
        }
    }
    Ok(())
}

async fn render(cmd: RenderCmd, cfg: &Config) -> Result<()> {
    let client = ApiClient::new(&cfg.server.base_url)?;
    let id = VideoId::from(cmd.id);
    let bytes = client
        .download_render(&id, &cmd.dest)
        .await
        .context(format!("Failed to download render of '{}'", id))?;
    eprintln!("{} bytes -> {}", bytes, cmd.dest.display());
    Ok(())
}
