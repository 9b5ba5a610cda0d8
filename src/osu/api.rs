//! Client for the `/v1/` API of bancho.py based servers.

use std::collections::HashMap;
use std::time::Duration;

use chrono::DateTime;
use chrono::NaiveDateTime;
use reqwest::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::Mode;
use super::Mods;
use crate::KselonError;

/// Every request gives up after this long.
const TIMEOUT: Duration = Duration::from_secs(5);

/// Who a request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(u64),
    Name(String),
}

impl Target {
    fn param(&self) -> (&'static str, Option<String>) {
        match self {
            Target::Id(id) => ("id", Some(id.to_string())),
            Target::Name(name) => ("name", Some(name.clone())),
        }
    }
}

/// Which scores to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScope {
    Recent,
    Best,
}

impl ScoreScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreScope::Recent => "recent",
            ScoreScope::Best => "best",
        }
    }
}

/// A beatmap, either by id or by the md5 of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    Id(u64),
    Md5(String),
}

#[derive(Debug, Clone)]
pub struct OsuApi {
    http: Client,
    /// Domain of the server, e.g. `refx.online`.
    server: String,
    api_key: String,
}

impl OsuApi {
    pub fn new(http: Client, server: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            server: server.into(),
            api_key: api_key.into(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// `refx.online` tracks xp and the values of its client side mods.
    pub fn is_refx(&self) -> bool {
        self.server.contains("refx.online")
    }

    /// Builds the url of an endpoint, leaving out parameters without a value.
    fn url(&self, endpoint: &str, params: &[(&str, Option<String>)]) -> Result<Url, KselonError> {
        let base = format!("https://api.{}/v1/{endpoint}", self.server);
        let present = params
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (*key, v.as_str())));

        Url::parse_with_params(&base, present).map_err(|e| KselonError::MissingFromSetup {
            reason: format!("bad osu! server `{}`: {e}", self.server),
        })
    }

    /// Sends a request. `None` means the server answered with 404.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, Option<String>)],
    ) -> Result<Option<T>, KselonError> {
        let url = self.url(endpoint, params)?;
        tracing::debug!("GET {url}");

        let mut request = self.http.get(url).timeout(TIMEOUT);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.error_for_status()?.json().await?;
        Ok(Some(body))
    }

    /// `scope` is one of `all`, `stats` or `info`.
    pub async fn get_player_info(
        &self,
        scope: &str,
        target: &Target,
    ) -> Result<Option<PlayerInfoResponse>, KselonError> {
        let params = [target.param(), ("scope", Some(scope.to_string()))];
        self.get("get_player_info", &params).await
    }

    pub async fn get_player_scores(
        &self,
        scope: ScoreScope,
        target: &Target,
        mods: Option<Mods>,
        mode: Option<Mode>,
    ) -> Result<Option<ScoresResponse>, KselonError> {
        self.get("get_player_scores", &score_params(scope, target, mods, mode))
            .await
    }

    pub async fn get_map_info(
        &self,
        target: &MapTarget,
    ) -> Result<Option<MapInfoResponse>, KselonError> {
        self.get("get_map_info", &map_params(target)).await
    }

    pub async fn get_map_scores(
        &self,
        scope: ScoreScope,
        target: &Target,
        mods: Option<Mods>,
        mode: Option<Mode>,
    ) -> Result<Option<ScoresResponse>, KselonError> {
        self.get("get_map_scores", &score_params(scope, target, mods, mode))
            .await
    }
}

fn score_params(
    scope: ScoreScope,
    target: &Target,
    mods: Option<Mods>,
    mode: Option<Mode>,
) -> Vec<(&'static str, Option<String>)> {
    vec![
        target.param(),
        ("mods", mods.map(Mods::to_acronyms)),
        ("mode", mode.map(|m| m.id().to_string())),
        ("scope", Some(scope.as_str().to_string())),
    ]
}

fn map_params(target: &MapTarget) -> Vec<(&'static str, Option<String>)> {
    match target {
        MapTarget::Id(id) => vec![("id", Some(id.to_string()))],
        MapTarget::Md5(md5) => vec![("md5", Some(md5.clone()))],
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfoResponse {
    pub status: String,
    pub player: PlayerInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    pub info: PlayerDetails,
    /// Stats keyed by mode id.
    #[serde(default)]
    pub stats: HashMap<String, PlayerStats>,
}

impl PlayerInfo {
    pub fn stats_for(&self, mode: Mode) -> Option<&PlayerStats> {
        self.stats.get(&mode.id().to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerDetails {
    pub id: u64,
    pub name: String,
    pub country: String,
    pub creation_time: i64,
    pub latest_activity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStats {
    pub pp: f64,
    pub acc: f64,
    pub rank: u64,
    pub country_rank: u64,
    pub plays: u64,
    /// In seconds.
    pub playtime: u64,
    pub xh_count: u64,
    pub x_count: u64,
    pub sh_count: u64,
    pub s_count: u64,
    pub a_count: u64,
    /// Only on refx.
    #[serde(default)]
    pub xp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoresResponse {
    pub status: String,
    #[serde(default)]
    pub scores: Vec<Score>,
    pub player: Option<ScoresPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoresPlayer {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Score {
    pub id: u64,
    pub score: i64,
    pub pp: f64,
    pub acc: f64,
    pub max_combo: u32,
    pub mods: u32,
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub nmiss: u32,
    pub grade: String,
    pub mode: i32,
    /// Naive date time, read as UTC.
    pub play_time: String,
    pub beatmap: Beatmap,
    /// Values of the client side mods refx allows.
    #[serde(flatten)]
    pub cheats: CheatValues,
}

impl Score {
    pub fn mods(&self) -> Mods {
        Mods::from_bits(self.mods)
    }

    pub fn mode(&self) -> Mode {
        Mode::from_id(self.mode)
    }

    pub fn failed(&self) -> bool {
        self.grade == "F"
    }

    /// Unix timestamp of [Score::play_time].
    pub fn played_at(&self) -> Option<i64> {
        if let Ok(time) = DateTime::parse_from_rfc3339(&self.play_time) {
            return Some(time.timestamp());
        }
        self.play_time
            .parse::<NaiveDateTime>()
            .ok()
            .map(|naive| naive.and_utc().timestamp())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheatValues {
    #[serde(default)]
    pub aim: f64,
    #[serde(default)]
    pub aim_value: f64,
    #[serde(default)]
    pub arc: f64,
    #[serde(default)]
    pub ar_value: f64,
    #[serde(default)]
    pub hdr: f64,
    #[serde(default)]
    pub tw: f64,
    #[serde(default)]
    pub twval: f64,
    #[serde(default)]
    pub cs: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapInfoResponse {
    pub status: String,
    pub map: Beatmap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Beatmap {
    pub id: u64,
    pub set_id: u64,
    pub md5: String,
    pub artist: String,
    pub title: String,
    pub version: String,
    pub max_combo: u32,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn api() -> OsuApi {
        OsuApi::new(Client::new(), "refx.online", "")
    }

    #[test]
    fn missing_params_are_left_out() {
        let target = Target::Name("ano ther".to_string());
        let params = score_params(ScoreScope::Best, &target, None, Some(Mode::RX_STD));
        let url = api().url("get_player_scores", &params).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.refx.online/v1/get_player_scores?name=ano+ther&mode=4&scope=best"
        );
    }

    #[test]
    fn map_lookup_by_md5() {
        let params = map_params(&MapTarget::Md5("abc".to_string()));
        let url = api().url("get_map_info", &params).unwrap();

        assert_eq!(url.as_str(), "https://api.refx.online/v1/get_map_info?md5=abc");
    }

    #[test]
    fn map_scores_by_id_with_mods() {
        let params = score_params(
            ScoreScope::Recent,
            &Target::Id(3),
            Some(Mods::HIDDEN | Mods::DOUBLETIME),
            None,
        );
        let url = api().url("get_map_scores", &params).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.refx.online/v1/get_map_scores?id=3&mods=HDDT&scope=recent"
        );
    }

    #[test]
    fn reads_scores_without_cheat_values() {
        let body = r#"{
            "status": "success",
            "scores": [{
                "id": 9, "score": 1234567, "pp": 321.456, "acc": 98.7,
                "max_combo": 500, "mods": 72, "n300": 400, "n100": 5, "n50": 0,
                "nmiss": 1, "grade": "A", "mode": 0, "status": 2,
                "play_time": "2024-05-01T12:00:00",
                "beatmap": {
                    "id": 1, "set_id": 2, "md5": "m", "artist": "a", "title": "t",
                    "version": "v", "max_combo": 600, "status": 2
                }
            }],
            "player": {"id": 3, "name": "ano", "clan": null}
        }"#;
        let response: ScoresResponse = serde_json::from_str(body).unwrap();
        let score = &response.scores[0];

        assert_eq!(score.mods(), Mods::HIDDEN | Mods::DOUBLETIME);
        assert_eq!(score.cheats.aim, 0.0);
        assert_eq!(score.played_at(), Some(1_714_564_800));
        assert_eq!(response.player.unwrap().name, "ano");
    }

    #[test]
    fn player_stats_are_keyed_by_mode() {
        let body = r#"{
            "status": "success",
            "player": {
                "info": {"id": 3, "name": "ano", "country": "th",
                         "creation_time": 1, "latest_activity": 2},
                "stats": {"4": {"pp": 1000, "acc": 99.1, "rank": 1, "country_rank": 1,
                                "plays": 10, "playtime": 100, "xh_count": 0, "x_count": 0,
                                "sh_count": 0, "s_count": 1, "a_count": 2, "xp": 55}}
            }
        }"#;
        let response: PlayerInfoResponse = serde_json::from_str(body).unwrap();

        assert!(response.player.stats_for(Mode::VN_STD).is_none());
        let stats = response.player.stats_for(Mode::RX_STD).unwrap();
        assert_eq!(stats.xp, Some(55.0));
    }
}
