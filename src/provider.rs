use std::path::Path;
use std::time::Duration;

use csv::ReaderBuilder;
use log::{debug, info, warn};
use serde::Deserialize;
use ureq::Agent;

use crate::config::ProviderSettings;
use crate::error::{PlcollectError, Result};

/// Provider status code for a successful lookup.
pub const SUCCESS_CODE: i64 = 1;

/// A playlist as handed to the matcher: a display name plus ordered track names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<String>,
}

/// Source of playlist metadata. `source` is whatever locates the playlist
/// for the implementation (a share link, a file path).
pub trait PlaylistProvider {
    fn fetch(&self, source: &str) -> Result<Playlist>;
}

#[derive(Debug, Deserialize)]
struct SongListResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<SongList>,
}

#[derive(Debug, Deserialize)]
struct SongList {
    name: String,
    #[serde(default)]
    songs: Vec<String>,
    #[serde(default)]
    songs_count: Option<usize>,
}

/// Client for the songlist service. Issues one POST per fetch, never retries.
pub struct HttpProvider {
    agent: Agent,
    api_url: String,
}

impl HttpProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            // Failures come back as HTTP 400 with a JSON body worth reading.
            .http_status_as_error(false)
            .build()
            .into();

        HttpProvider {
            agent,
            api_url: settings.api_url.clone(),
        }
    }
}

impl PlaylistProvider for HttpProvider {
    fn fetch(&self, link: &str) -> Result<Playlist> {
        info!("Requesting playlist {} from {}", link, self.api_url);

        let mut response = self
            .agent
            .post(&self.api_url)
            .query("detailed", "true")
            .query("format", "song")
            .send_form([("url", link)])
            .map_err(|e| PlcollectError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| PlcollectError::ProviderUnavailable(e.to_string()))?;

        debug!("Provider answered HTTP {} ({} bytes)", status, body.len());
        interpret(&body)
    }
}

/// Turn a songlist response body into a playlist or the matching error.
pub fn interpret(body: &str) -> Result<Playlist> {
    let response: SongListResponse = serde_json::from_str(body)
        .map_err(|e| PlcollectError::ProviderResponse(e.to_string()))?;

    if response.code != SUCCESS_CODE {
        return Err(PlcollectError::ProviderRejected {
            code: response.code,
            message: response.msg,
        });
    }

    let data = response.data.ok_or_else(|| {
        PlcollectError::ProviderResponse("success status without playlist data".to_string())
    })?;

    if let Some(count) = data.songs_count
        && count != data.songs.len()
    {
        warn!(
            "Provider reported {} songs but returned {}",
            count,
            data.songs.len()
        );
    }

    Ok(Playlist {
        name: data.name,
        tracks: data.songs,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CsvTrackRow {
    #[serde(rename = "Track Name")]
    track_name: String,
}

/// Reads playlist exports (one row per track, `Track Name` column).
/// The playlist is named after the file stem.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvProvider;

impl PlaylistProvider for CsvProvider {
    fn fetch(&self, source: &str) -> Result<Playlist> {
        let path = Path::new(source);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut tracks = Vec::new();

        for result in reader.deserialize::<CsvTrackRow>() {
            match result {
                Ok(row) if !row.track_name.trim().is_empty() => tracks.push(row.track_name),
                Ok(_) => debug!("Skipping row without a track name in {:?}", path),
                Err(e) => warn!("Skipping invalid row in {:?}: {}", path, e),
            }
        }

        Ok(Playlist {
            name: path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            tracks,
        })
    }
}
