//! LastFM's scrobbling API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Deserializer;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;

use crate::lib;
use crate::serenity;
use crate::KselonError;

const BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";

/// LastFM can be slow.
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct LastFm {
    http: Client,
    api_key: String,
}

impl LastFm {
    pub fn new(http: Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        username: &str,
    ) -> Result<T, KselonError> {
        let params = [
            ("method", method),
            ("user", username),
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
        ];

        let body = self
            .http
            .get(BASE_URL)
            .query(&params)
            .timeout(TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    /// Most recent first, including the track playing right now.
    pub async fn recent_tracks(&self, username: &str) -> Result<Vec<Track>, KselonError> {
        let response: RecentTracksResponse = self.get("user.getrecenttracks", username).await?;
        Ok(response.recenttracks.track)
    }

    /// Total scrobbles of a user.
    pub async fn scrobbles(&self, username: &str) -> Result<String, KselonError> {
        let response: UserInfoResponse = self.get("user.getinfo", username).await?;
        Ok(response.user.playcount)
    }
}

#[derive(Debug, Deserialize)]
struct RecentTracksResponse {
    recenttracks: RecentTracks,
}

#[derive(Debug, Deserialize)]
struct RecentTracks {
    /// A single track isn't wrapped in a list.
    #[serde(default, deserialize_with = "one_or_many")]
    track: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: UserInfo,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(deserialize_with = "string_or_number")]
    playcount: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artist: Option<Text>,
    #[serde(default)]
    pub album: Option<Text>,
    #[serde(default)]
    pub image: Vec<Image>,
    #[serde(default, rename = "@attr")]
    pub attr: Option<TrackAttr>,
    #[serde(default)]
    pub date: Option<PlayedDate>,
}

impl Track {
    pub fn now_playing(&self) -> bool {
        self.attr
            .as_ref()
            .is_some_and(|attr| attr.nowplaying.as_deref() == Some("true"))
    }

    /// When the track was scrobbled, if it isn't playing anymore.
    pub fn played_at(&self) -> Option<i64> {
        if self.now_playing() {
            return None;
        }
        self.date.as_ref().and_then(|d| d.uts.parse().ok())
    }

    pub fn large_image(&self) -> Option<&str> {
        self.image
            .iter()
            .find(|img| img.size == "large")
            .map(|img| img.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Text {
    #[serde(rename = "#text", default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub size: String,
    #[serde(rename = "#text", default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackAttr {
    pub nowplaying: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayedDate {
    pub uts: String,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Track>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Track>),
        One(Box<Track>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(tracks) => tracks,
        OneOrMany::One(track) => vec![*track],
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// One page of `nowplaying`. `index` starts at 0.
pub fn track_embed(
    track: &Track,
    index: usize,
    total: usize,
    username: &str,
    scrobbles: Option<&str>,
) -> CreateEmbed {
    let title = if track.now_playing() {
        "Now Playing"
    } else {
        "Recent Track"
    };
    let text_or_unknown = |text: &Option<Text>| {
        text.as_ref()
            .map(|t| t.text.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let mut embed = CreateEmbed::new()
        .title(title)
        .url(format!("https://www.last.fm/user/{username}"))
        .colour(rand::random::<u32>() & 0xFFFFFF)
        .field(
            "Track",
            format!("**{}**", track.name.as_deref().unwrap_or("Unknown")),
            false,
        )
        .field("Artist", text_or_unknown(&track.artist), true)
        .field("Album", text_or_unknown(&track.album), true);

    if let Some(played) = track.played_at() {
        embed = embed.field("Played", lib::timestamp(played, 'R'), true);
    }
    if let Some(image) = track.large_image() {
        embed = embed.thumbnail(image);
    }

    embed.footer(CreateEmbedFooter::new(format!(
        "Track {}/{total} • {username} | total scrobbles {}",
        index + 1,
        scrobbles.unwrap_or("unknown")
    )))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reads_a_list_of_tracks() {
        let body = r##"{"recenttracks": {"track": [
            {"name": "Blue", "artist": {"#text": "yama"}, "album": {"#text": ""},
             "image": [{"size": "small", "#text": "s.png"}, {"size": "large", "#text": "l.png"}],
             "@attr": {"nowplaying": "true"}},
            {"name": "Haru", "artist": {"#text": "yorushika"}, "date": {"uts": "1700000000", "#text": "x"}}
        ], "@attr": {"user": "ano"}}}"##;
        let response: RecentTracksResponse = serde_json::from_str(body).unwrap();
        let tracks = response.recenttracks.track;

        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].now_playing());
        assert_eq!(tracks[0].played_at(), None);
        assert_eq!(tracks[0].large_image(), Some("l.png"));
        assert!(!tracks[1].now_playing());
        assert_eq!(tracks[1].played_at(), Some(1700000000));
        assert_eq!(tracks[1].large_image(), None);
    }

    #[test]
    fn reads_a_single_track() {
        let body = r##"{"recenttracks": {"track": {"name": "Only"}}}"##;
        let response: RecentTracksResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.recenttracks.track.len(), 1);
    }

    #[test]
    fn empty_list_has_no_tracks() {
        let body = r##"{"recenttracks": {"track": []}}"##;
        let response: RecentTracksResponse = serde_json::from_str(body).unwrap();

        assert!(response.recenttracks.track.is_empty());
    }

    #[test]
    fn missing_tracks_are_empty() {
        let body = r##"{"recenttracks": {"@attr": {"total": "0"}}}"##;
        let response: RecentTracksResponse = serde_json::from_str(body).unwrap();

        assert!(response.recenttracks.track.is_empty());
    }

    #[test]
    fn playcount_may_be_a_number() {
        let info: UserInfoResponse = serde_json::from_str(r#"{"user": {"playcount": 42}}"#).unwrap();
        assert_eq!(info.user.playcount, "42");

        let info: UserInfoResponse =
            serde_json::from_str(r#"{"user": {"playcount": "1337"}}"#).unwrap();
        assert_eq!(info.user.playcount, "1337");
    }
}
