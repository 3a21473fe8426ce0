use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::NetworkSettings;
use crate::library::{LyricLine, LyricsResponse, Lrc, Media};

use super::error::DaemonError;

/// HTTP side of the daemon: catalog, lyrics and playlist creation.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct CreatePlaylist<'a> {
    meta: Vec<(&'a str, &'a str)>,
    tracks: &'a [String],
}

/// `{"path": ...}` on success, `{"error": ...}` otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateReply {
    Created { path: String },
    Failed { error: String },
}

impl DaemonClient {
    pub fn new(network: &NetworkSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: network.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn media_uri(&self) -> String {
        format!("http://{}/media", self.endpoint)
    }

    /// Cover art for an album. `size` asks the daemon for a square thumbnail.
    pub fn cover_uri(&self, album_id: &str, ext: &str, size: Option<u32>) -> String {
        match size {
            Some(px) if px > 0 => {
                format!("http://{}/cover/{album_id}{ext}?size={px}x{px}", self.endpoint)
            }
            _ => format!("http://{}/cover/{album_id}{ext}", self.endpoint),
        }
    }

    pub fn audio_uri(&self, path: &str) -> String {
        format!("http://{}/audio?path={}", self.endpoint, urlencoding::encode(path))
    }

    pub fn lyrics_uri(&self, path: &str) -> String {
        format!("http://{}/lyrics?path={}", self.endpoint, urlencoding::encode(path))
    }

    pub fn search_lyrics_uri(&self, path: &str) -> String {
        format!(
            "http://{}/search/lyrics?path={}",
            self.endpoint,
            urlencoding::encode(path)
        )
    }

    pub fn playlist_create_uri(&self) -> String {
        format!("http://{}/playlist/create", self.endpoint)
    }

    pub fn socket_uri(&self) -> String {
        format!("ws://{}/ws", self.endpoint)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, uri: String) -> Result<T, DaemonError> {
        debug!("GET {uri}");
        let response = self.http.get(&uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DaemonError::Status {
                status: status.as_u16(),
                uri,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Whole library: tracks, albums and playlists.
    pub async fn media(&self) -> Result<Media, DaemonError> {
        self.get_json(self.media_uri()).await
    }

    /// Timed lyric lines the daemon has on file for `path`; empty when none.
    pub async fn lyrics(&self, path: &str) -> Result<Vec<LyricLine>, DaemonError> {
        let response: LyricsResponse = self.get_json(self.lyrics_uri(path)).await?;
        Ok(response
            .lyrics
            .into_iter()
            .next()
            .map(|lrc| lrc.parsed)
            .unwrap_or_default())
    }

    /// Ask the daemon to look lyrics up for `path` from its external sources.
    pub async fn search_lyrics(&self, path: &str) -> Result<Vec<Lrc>, DaemonError> {
        let response: LyricsResponse = self.get_json(self.search_lyrics_uri(path)).await?;
        Ok(response.lyrics)
    }

    /// Create a playlist. Returns the daemon's path for it.
    pub async fn create_playlist(
        &self,
        metadata: &[(String, String)],
        tracks: &[String],
    ) -> Result<String, DaemonError> {
        let body = playlist_body(metadata, tracks)?;
        let uri = self.playlist_create_uri();
        debug!("POST {uri}");
        let response = self
            .http
            .post(&uri)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let text = response.text().await?;
        parse_create_reply(&text)
    }
}

pub(crate) fn playlist_body(
    metadata: &[(String, String)],
    tracks: &[String],
) -> Result<String, DaemonError> {
    let body = CreatePlaylist {
        meta: metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect(),
        tracks,
    };
    Ok(serde_json::to_string(&body)?)
}

pub(crate) fn parse_create_reply(text: &str) -> Result<String, DaemonError> {
    match serde_json::from_str::<CreateReply>(text)? {
        CreateReply::Created { path } => Ok(path),
        CreateReply::Failed { error } => Err(DaemonError::Rejected(error)),
    }
}
