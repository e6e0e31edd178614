use crate::cue::Cue;

use std::io::{BufWriter, Write};
use std::time::Duration;

use anyhow::{Context, Result};

pub fn serialise<W: Write>(cues: &[Cue], output: W) -> Result<()> {
    let mut writer = BufWriter::new(output);
    write_track(&mut writer, cues).context("Failed to write track.")?;
    writer.flush().context("Failed to write track.")?;
    Ok(())
}

pub fn write_track<W: Write>(buf: &mut W, cues: &[Cue]) -> Result<()> {
    writeln!(buf, "WEBVTT")?;
    writeln!(buf)?;
    for cue in cues {
        write_cue(buf, cue)?;
    }
    Ok(())
}

fn write_cue<W: Write>(buf: &mut W, cue: &Cue) -> Result<()> {
    writeln!(buf, "{}", time_range_line(cue))?;
    if !cue.text.is_empty() {
        writeln!(buf, "{}", cue.text)?;
    }
    writeln!(buf)?;
    Ok(())
}

pub fn time_range_line(cue: &Cue) -> String {
    format!("{} --> {}", format_ts(cue.start), format_ts(cue.end))
}

fn format_ts(timestamp: Duration) -> String {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.as_millis() % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
