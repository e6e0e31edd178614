use crate::cue::Cue;

use std::time::Duration;

use nom::bytes::complete::{tag, take_while, take_while_m_n};
use nom::character::complete::digit1;
use nom::combinator::{all_consuming, map_res};
use nom::error::VerboseError;
use nom::IResult;

/// A line the parser discarded because it was expected to hold a time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based, counted after line ending normalisation.
    pub line_number: usize,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct ParsedTrack {
    pub cues: Vec<Cue>,
    pub skipped: Vec<SkippedLine>,
}

/// Lenient parser for WebVTT-like tracks.
///
/// Parsing never fails: anything that does not look like a cue is skipped and
/// reported in [`ParsedTrack::skipped`], so a damaged track still yields every
/// cue that could be read.
pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    pub fn parse(&mut self, input: &str) -> ParsedTrack {
        let normalised = input.replace('\r', "");
        let lines: Vec<&str> = normalised.split('\n').collect();
        let is_blank = |i: usize| lines[i].trim().is_empty();

        let mut track = ParsedTrack::default();
        let mut i = 0;

        // Header block, then the blank lines separating it from the first cue.
        while i < lines.len() && !is_blank(i) {
            i += 1;
        }
        while i < lines.len() && is_blank(i) {
            i += 1;
        }

        while i < lines.len() {
            if is_index_line(lines[i]) {
                i += 1;
                if i >= lines.len() {
                    break;
                }
            }

            let (start, end) = match time_range(lines[i].trim()) {
                Ok((_, range)) => range,
                Err(_) => {
                    if !is_blank(i) {
                        tracing::debug!(line = i + 1, "skipping line without a time range");
                        track.skipped.push(SkippedLine {
                            line_number: i + 1,
                            content: lines[i].to_string(),
                        });
                    }
                    i += 1;
                    continue;
                }
            };
            i += 1;

            let mut text = Vec::new();
            while i < lines.len() && !is_blank(i) {
                text.push(lines[i]);
                i += 1;
            }
            track.cues.push(Cue::new(start, end, text.join("\n").trim()));

            while i < lines.len() && is_blank(i) {
                i += 1;
            }
        }

        track
    }
}

fn is_index_line(line: &str) -> bool {
    all_consuming(digit1::<&str, VerboseError<&str>>)(line.trim()).is_ok()
}

/// Matches the start of a cue timing line. Cue settings after the second
/// timestamp are left unconsumed.
fn time_range(input: &str) -> IResult<&str, (Duration, Duration), VerboseError<&str>> {
    let (input, start) = timestamp(input)?;
    let (input, _) = take_while(char::is_whitespace)(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = take_while(char::is_whitespace)(input)?;
    let (input, end) = timestamp(input)?;

    Ok((input, (start, end)))
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    let (input, hours) = fixed_digits(2, input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = fixed_digits(2, input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = fixed_digits(2, input)?;
    let (input, _) = tag(".")(input)?;
    let (input, millis) = fixed_digits(3, input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

/// Exactly `n` ASCII digits, no padding or truncation.
fn fixed_digits(n: usize, input: &str) -> IResult<&str, u64, VerboseError<&str>> {
    map_res(
        take_while_m_n(n, n, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>(),
    )(input)
}
