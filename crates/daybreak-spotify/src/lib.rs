//! Spotify track metadata client, used to enrich notices that carry a song
//! link. Enrichment is strictly best-effort: every failure mode collapses
//! into an [`Enrichment`] variant and is logged, never propagated.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const TRACKS_URL: &str = "https://api.spotify.com/v1/tracks";

#[derive(Debug, Clone)]
pub struct TrackDetails {
    pub title: String,
    pub artist: String,
    pub album_cover: Option<String>,
}

/// What enrichment produced for a given song URL.
#[derive(Debug)]
pub enum Enrichment {
    /// Metadata resolved; attach it to the notice.
    Enriched(TrackDetails),
    /// The URL is not a recognized track link; keep the raw URL only.
    Skipped,
    /// Token exchange, HTTP, or decode failure; keep the raw URL only.
    Failed,
}

#[derive(Debug, Error)]
#[error("not a recognized track URL: {0}")]
pub struct ParseError(String);

/// Extract the track ID from a `.../track/<id>[?...]` Spotify URL.
pub fn parse_track_id(song_url: &str) -> Result<&str, ParseError> {
    if !song_url.contains("spotify.com/track/") {
        return Err(ParseError(song_url.to_string()));
    }

    let rest = match song_url.split_once("/track/") {
        Some((_, rest)) => rest,
        None => return Err(ParseError(song_url.to_string())),
    };

    let id = rest.split('?').next().unwrap_or(rest);
    if id.is_empty() {
        return Err(ParseError(song_url.to_string()));
    }
    Ok(id)
}

pub struct Client {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl Client {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
        }
    }

    /// Best-effort enrichment for a song URL. Never fails the caller.
    pub async fn enrich(&self, song_url: &str) -> Enrichment {
        let track_id = match parse_track_id(song_url) {
            Ok(id) => id,
            Err(e) => {
                debug!("Skipping song enrichment: {}", e);
                return Enrichment::Skipped;
            }
        };

        match self.fetch_track(track_id).await {
            Ok(details) => Enrichment::Enriched(details),
            Err(e) => {
                warn!("Track lookup failed for '{}': {}", song_url, e);
                Enrichment::Failed
            }
        }
    }

    async fn fetch_track(&self, track_id: &str) -> Result<TrackDetails> {
        let token = self.access_token().await?;

        let track: TrackResponse = self
            .http
            .get(format!("{}/{}", TRACKS_URL, track_id))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let artist = track
            .artists
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("track {} lists no artists", track_id))?
            .name;
        let album_cover = track.album.images.into_iter().next().map(|img| img.url);

        Ok(TrackDetails {
            title: track.name,
            artist,
            album_cover,
        })
    }

    /// Client-credentials flow; tokens are short-lived and fetched per call.
    async fn access_token(&self) -> Result<String> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(anyhow!("Spotify credentials not configured"));
        }

        let resp: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TrackResponse {
    name: String,
    artists: Vec<ArtistResponse>,
    album: AlbumResponse,
}

#[derive(Deserialize)]
struct ArtistResponse {
    name: String,
}

#[derive(Deserialize)]
struct AlbumResponse {
    images: Vec<ImageResponse>,
}

#[derive(Deserialize)]
struct ImageResponse {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_track_url() {
        let id = parse_track_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(id, "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn strips_query_parameters() {
        let id =
            parse_track_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc123")
                .unwrap();
        assert_eq!(id, "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn rejects_non_track_urls() {
        assert!(parse_track_id("https://open.spotify.com/album/xyz").is_err());
        assert!(parse_track_id("https://example.com/track/xyz").is_err());
        assert!(parse_track_id("not a url at all").is_err());
        assert!(parse_track_id("https://open.spotify.com/track/").is_err());
    }
}
