//! HTTP client for the captioning server.

use crate::error::{LivecapError, Result};

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use futures_util::StreamExt;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_LANGUAGE: &str = "ar";

/// Server-side identifier of an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which text the server puts into the generated track.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Source transcript and Hebrew translation, one above the other.
    #[default]
    Dual,
    He,
    En,
    /// Source-language transcript only.
    Src,
}

/// Operations the captioning flow needs from the server.
#[allow(async_fn_in_trait)]
pub trait CaptionService {
    async fn upload(&self, video: &Path) -> Result<VideoId>;

    /// Returns the URL of the generated subtitle track.
    async fn transcribe(&self, id: &VideoId, output: OutputMode, language: &str) -> Result<Url>;

    async fn fetch_track(&self, url: &Url) -> Result<String>;

    /// Where the server plays the uploaded video from.
    fn video_url(&self, id: &VideoId) -> Result<Url>;

    /// Streams the captioned render to `dest`, returning the number of bytes written.
    async fn download_render(&self, id: &VideoId, dest: &Path) -> Result<u64>;
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
    id: Option<String>,
    vtt: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    id: &'a str,
    output: OutputMode,
    language: &'a str,
}

/// Decodes the `{ ok, error, ... }` envelope every JSON endpoint answers with.
/// Failures carry the server's message when it sent one, `fallback` otherwise.
fn decode_envelope(status: StatusCode, body: &str, fallback: &str) -> Result<Envelope> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(LivecapError::Api(format!("{} ({})", fallback, status)))
        }
        Err(err) => {
            return Err(LivecapError::Api(format!(
                "{}: invalid response: {}",
                fallback, err
            )))
        }
    };
    if envelope.ok {
        Ok(envelope)
    } else {
        let message = envelope
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Err(LivecapError::Api(message))
    }
}

/// Blank language selectors fall back to [`DEFAULT_LANGUAGE`].
pub fn normalise_language(language: &str) -> &str {
    match language.trim() {
        "" => DEFAULT_LANGUAGE,
        trimmed => trimmed,
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| LivecapError::Config(format!("invalid server URL '{}': {}", base_url, e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    /// Resolves a server path or a URL returned by the server.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| LivecapError::Api(format!("invalid URL '{}': {}", path, e)))
    }

    pub fn render_url(&self, id: &VideoId) -> Result<Url> {
        self.url(&format!("/api/render/{}", id))
    }
}

/// Sibling of `dest` that a download is streamed into before it is renamed.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("render"));
    name.push(".part");
    dest.with_file_name(name)
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

impl CaptionService for ApiClient {
    async fn upload(&self, video: &Path) -> Result<VideoId> {
        let file = tokio::fs::File::open(video).await?;
        let size = file.metadata().await?.len();
        let file_name = video
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();
        tracing::info!(file = %video.display(), size, "uploading video");

        let part = reqwest::multipart::Part::stream_with_length(reqwest::Body::from(file), size)
            .file_name(file_name);
        let form = reqwest::multipart::Form::new().part("video", part);
        let response = self
            .http
            .post(self.url("/api/upload")?)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = decode_envelope(status, &body, "Upload failed")?;
        let id = envelope
            .id
            .ok_or_else(|| LivecapError::Api("Upload failed: no id in response".to_string()))?;
        tracing::info!(id = %id, "video uploaded");
        Ok(VideoId(id))
    }

    async fn transcribe(&self, id: &VideoId, output: OutputMode, language: &str) -> Result<Url> {
        let request = TranscribeRequest {
            id: id.as_str(),
            output,
            language: normalise_language(language),
        };
        tracing::info!(id = %id, ?output, language = request.language, "requesting transcription");

        let response = self
            .http
            .post(self.url("/api/transcribe")?)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = decode_envelope(status, &body, "CC failed")?;
        let track = envelope
            .vtt
            .ok_or_else(|| LivecapError::Api("CC failed: no track in response".to_string()))?;
        self.url(&track)
    }

    async fn fetch_track(&self, url: &Url) -> Result<String> {
        tracing::debug!(%url, "fetching subtitle track");
        let text = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    fn video_url(&self, id: &VideoId) -> Result<Url> {
        self.url(&format!("/api/video/{}", id))
    }

    async fn download_render(&self, id: &VideoId, dest: &Path) -> Result<u64> {
        let response = self.http.get(self.render_url(id)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(decode_envelope(status, &body, "Render failed")
                .err()
                .unwrap_or_else(|| LivecapError::Api(format!("Render failed ({})", status))));
        }

        // Only a complete render ever appears at `dest`.
        let part = partial_path(dest);
        let written = match stream_to_file(response, &part).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part).await {
                    tracing::debug!(error = %remove_err, "no partial render to remove");
                }
                return Err(err);
            }
        };
        if let Err(err) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(err.into());
        }
        tracing::info!(id = %id, bytes = written, dest = %dest.display(), "render downloaded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_passes_through() {
        let env = decode_envelope(
            StatusCode::OK,
            r#"{"ok":true,"id":"abc","filename":"abc.mp4"}"#,
            "Upload failed",
        )
        .unwrap();
        assert_eq!(env.id.as_deref(), Some("abc"));
    }

    #[test]
    fn server_error_message_is_kept() {
        let err = decode_envelope(
            StatusCode::NOT_FOUND,
            r#"{"ok":false,"error":"video not found"}"#,
            "CC failed",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "video not found");
    }

    #[test]
    fn missing_message_uses_fallback() {
        let err = decode_envelope(StatusCode::OK, r#"{"ok":false}"#, "CC failed").unwrap_err();
        assert_eq!(err.to_string(), "CC failed");
    }

    #[test]
    fn non_json_error_mentions_status() {
        let err = decode_envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>boom</html>",
            "Upload failed",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Upload failed (500 Internal Server Error)");
    }

    #[test]
    fn transcribe_request_shape() {
        let body = serde_json::to_value(TranscribeRequest {
            id: "abc",
            output: OutputMode::Src,
            language: normalise_language("  "),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"id": "abc", "output": "src", "language": "ar"})
        );
    }

    #[test]
    fn track_urls_resolve_against_the_server() {
        let client = ApiClient::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            client.url("/api/vtt/abc").unwrap().as_str(),
            "http://127.0.0.1:5000/api/vtt/abc"
        );
        assert_eq!(
            client.url("http://cdn.example/t.vtt").unwrap().as_str(),
            "http://cdn.example/t.vtt"
        );
        let id = VideoId::from("abc".to_string());
        assert_eq!(
            client.render_url(&id).unwrap().as_str(),
            "http://127.0.0.1:5000/api/render/abc"
        );
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(LivecapError::Config(_))
        ));
    }

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn json_response(status: &str, body: serde_json::Value) -> Vec<u8> {
        http_response(status, "application/json", body.to_string().as_bytes())
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Reads one request, headers and body, and returns it as text.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::from_utf8_lossy(&buf).into_owned();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let chunked = head.contains("transfer-encoding: chunked");
        loop {
            let complete = match content_length {
                Some(len) => buf.len() >= header_end + len,
                None if chunked => buf.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if complete {
                break;
            }
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answers a single request with `response` and hands back what was sent.
    async fn serve_once(response: Vec<u8>) -> (ApiClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(&response).await.unwrap();
            let _ = stream.shutdown().await;
            request
        });
        let client = ApiClient::new(&format!("http://{}", addr)).unwrap();
        (client, server)
    }

    fn request_body(request: &str) -> &str {
        request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
    }

    #[tokio::test]
    async fn upload_sends_the_video_field() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really an mp4").unwrap();

        let (client, server) = serve_once(json_response(
            "200 OK",
            serde_json::json!({"ok": true, "id": "abc", "filename": "abc.mp4"}),
        ))
        .await;
        let id = client.upload(&video).await.unwrap();
        assert_eq!(id.as_str(), "abc");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/upload "), "{}", request);
        assert!(request.contains("name=\"video\""));
        assert!(request.contains("filename=\"clip.mp4\""));
        assert!(request.contains("not really an mp4"));
    }

    #[tokio::test]
    async fn upload_failure_carries_the_server_message() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"x").unwrap();

        let (client, server) = serve_once(json_response(
            "400 Bad Request",
            serde_json::json!({"ok": false, "error": "no file"}),
        ))
        .await;
        let err = client.upload(&video).await.unwrap_err();
        assert!(matches!(err, LivecapError::Api(_)));
        assert_eq!(err.to_string(), "no file");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn transcribe_posts_json_and_resolves_relative_track() {
        let (client, server) = serve_once(json_response(
            "200 OK",
            serde_json::json!({"ok": true, "vtt": "/api/vtt/abc"}),
        ))
        .await;
        let id = VideoId::from("abc".to_string());
        let url = client.transcribe(&id, OutputMode::He, " ").await.unwrap();
        assert_eq!(url, client.url("/api/vtt/abc").unwrap());
        assert_eq!(url.path(), "/api/vtt/abc");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/transcribe "), "{}", request);
        let body: serde_json::Value = serde_json::from_str(request_body(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"id": "abc", "output": "he", "language": "ar"})
        );
    }

    #[tokio::test]
    async fn fetch_track_rejects_error_status() {
        let (client, server) = serve_once(http_response("404 Not Found", "text/plain", b"gone")).await;
        let url = client.url("/api/vtt/missing").unwrap();
        let err = client.fetch_track(&url).await.unwrap_err();
        assert!(matches!(err, LivecapError::Http(_)), "{:?}", err);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/vtt/missing "), "{}", request);
    }

    #[tokio::test]
    async fn render_error_body_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");

        let (client, server) = serve_once(json_response(
            "400 Bad Request",
            serde_json::json!({"ok": false, "error": "no captions yet"}),
        ))
        .await;
        let id = VideoId::from("abc".to_string());
        let err = client.download_render(&id, &dest).await.unwrap_err();
        assert_eq!(err.to_string(), "no captions yet");
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/render/abc "), "{}", request);
    }

    #[tokio::test]
    async fn render_lands_at_dest_only_when_complete() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");

        let (client, server) = serve_once(http_response("200 OK", "video/mp4", b"rendered")).await;
        let id = VideoId::from("abc".to_string());
        let written = client.download_render(&id, &dest).await.unwrap();
        assert_eq!(written, 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"rendered");
        assert!(!partial_path(&dest).exists());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_render_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");

        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 1000000\r\n\r\n".to_vec();
        response.extend(std::iter::repeat(0u8).take(5000));
        let (client, server) = serve_once(response).await;

        let id = VideoId::from("abc".to_string());
        let result = client.download_render(&id, &dest).await;
        assert!(result.is_err(), "{:?}", result);
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
        server.await.unwrap();
    }

    #[test]
    fn partial_path_is_a_sibling() {
        let dest = Path::new("/tmp/renders/out.mp4");
        assert_eq!(partial_path(dest), Path::new("/tmp/renders/out.mp4.part"));
    }

    #[test]
    fn video_url_points_at_the_player_endpoint() {
        let client = ApiClient::new("http://127.0.0.1:5000").unwrap();
        let id = VideoId::from("abc".to_string());
        assert_eq!(
            client.video_url(&id).unwrap().as_str(),
            "http://127.0.0.1:5000/api/video/abc"
        );
    }
}
