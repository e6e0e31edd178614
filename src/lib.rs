//! Client side of a video captioning service.
//!
//! [`parser`] turns the WebVTT-like tracks produced by the server into
//! [`cue::Cue`]s, [`player`] maps a playback clock onto them, and [`session`]
//! drives the upload, transcribe and render round trips through [`client`].

pub mod client;
pub mod clock;
pub mod config;
pub mod controls;
pub mod cue;
pub mod error;
pub mod i18n;
pub mod parser;
pub mod player;
pub mod serialiser;
pub mod session;
