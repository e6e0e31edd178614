use crate::client::{CaptionService, OutputMode, VideoId};
use crate::error::{LivecapError, Result};
use crate::i18n::{Labels, Language};
use crate::parser::{ParsedTrack, Parser};
use crate::player::{CaptionPlayer, CaptionToggle};

use std::path::Path;

use reqwest::Url;

/// The single status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub ok: bool,
}

/// Which actions are currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actions {
    pub upload: bool,
    pub transcribe: bool,
    pub download: bool,
}

/// Upload, transcribe and render flow around one [`CaptionPlayer`].
///
/// Collaborator failures end up in [`Session::status`] and are also returned
/// to the caller. They never touch the caption sequence that is playing.
pub struct Session<S> {
    service: S,
    player: CaptionPlayer,
    language: Language,
    current_id: Option<VideoId>,
    status: Status,
    actions: Actions,
}

impl<S: CaptionService> Session<S> {
    pub fn new(service: S, player: CaptionPlayer, language: Language) -> Self {
        Self {
            service,
            player,
            language,
            current_id: None,
            status: Status {
                text: language.labels().ready.to_string(),
                ok: true,
            },
            actions: Actions {
                upload: true,
                transcribe: false,
                download: false,
            },
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn actions(&self) -> Actions {
        self.actions
    }

    pub fn current_id(&self) -> Option<&VideoId> {
        self.current_id.as_ref()
    }

    pub fn labels(&self) -> &'static Labels {
        self.language.labels()
    }

    pub fn toggle(&self) -> &CaptionToggle {
        self.player.toggle()
    }

    pub fn player(&self) -> &CaptionPlayer {
        &self.player
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Playback URL of the uploaded video, once there is one.
    pub fn video_url(&self) -> Result<Option<Url>> {
        self.current_id
            .as_ref()
            .map(|id| self.service.video_url(id))
            .transpose()
    }

    /// Switches the interface language and resets the status line.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.set_status(language.labels().ready.to_string(), true);
    }

    fn set_status(&mut self, text: String, ok: bool) {
        if ok {
            tracing::info!(status = %text, "status");
        } else {
            tracing::warn!(status = %text, "status");
        }
        self.status = Status { text, ok };
    }

    pub async fn upload(&mut self, video: &Path) -> Result<()> {
        let messages = self.language.messages();
        if !video.is_file() {
            self.set_status(messages.pick_video.to_string(), false);
            return Err(LivecapError::Api(messages.pick_video.to_string()));
        }

        self.set_status(messages.uploading.to_string(), true);
        self.actions = Actions {
            upload: false,
            transcribe: false,
            download: false,
        };

        let result = self.service.upload(video).await;
        self.actions.upload = true;
        match result {
            Ok(id) => {
                self.current_id = Some(id);
                self.actions.transcribe = true;
                self.set_status(messages.uploaded.to_string(), true);
                Ok(())
            }
            Err(err) => {
                self.set_status(format!("{}{}", messages.upload_failed, err), false);
                Err(err)
            }
        }
    }

    /// Requests a track for the current upload and plays it.
    ///
    /// Returns `Ok(None)` without doing anything when there is no upload to
    /// transcribe, otherwise the number of cues now playing.
    pub async fn generate_captions(
        &mut self,
        output: OutputMode,
        language: &str,
    ) -> Result<Option<usize>> {
        let id = match (&self.current_id, self.actions.transcribe) {
            (Some(id), true) => id.clone(),
            _ => return Ok(None),
        };
        let messages = self.language.messages();

        self.set_status(messages.transcribing.to_string(), true);
        self.actions.transcribe = false;
        self.actions.download = false;

        let result = self.load_track(&id, output, language).await;
        self.actions.transcribe = true;
        match result {
            Ok(track) => {
                let count = track.cues.len();
                if !track.skipped.is_empty() {
                    tracing::warn!(
                        skipped = track.skipped.len(),
                        cues = count,
                        "track had lines that could not be parsed"
                    );
                }
                self.player.start(track.cues);
                self.set_status(messages.captions_ready.to_string(), true);
                self.actions.download = true;
                Ok(Some(count))
            }
            Err(err) => {
                self.set_status(format!("{}{}", messages.captions_failed, err), false);
                Err(err)
            }
        }
    }

    async fn load_track(
        &self,
        id: &VideoId,
        output: OutputMode,
        language: &str,
    ) -> Result<ParsedTrack> {
        let url = self.service.transcribe(id, output, language).await?;
        let text = self.service.fetch_track(&url).await?;
        Ok(Parser::new().parse(&text))
    }

    /// Downloads the captioned render of the current upload, if captions were
    /// generated for it.
    pub async fn download_render(&mut self, dest: &Path) -> Result<Option<u64>> {
        let id = match (&self.current_id, self.actions.download) {
            (Some(id), true) => id.clone(),
            _ => return Ok(None),
        };
        match self.service.download_render(&id, dest).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) => {
                self.set_status(err.to_string(), false);
                Err(err)
            }
        }
    }
}
