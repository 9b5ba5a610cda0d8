//! Star rating and pp calculation with [rosu_pp].
//!
//! Beatmap files are downloaded from osu! and kept on disk, named after their md5.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use rosu_pp::Beatmap;
use rosu_pp::Performance;

use super::api::Score;
use super::Mode;
use super::Mods;
use crate::KselonError;

/// Downloads give up after this long.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Numbers shown next to a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCalculation {
    /// The pp the server gave the score.
    pub pp: f64,
    pub stars: f64,
    /// The pp of the same play without misses and with full combo.
    pub pp_if_fc: f64,
}

/// What to calculate for a beatmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    pub mode: Mode,
    pub mods: Mods,
    pub combo: u32,
    pub accuracy: f64,
    pub misses: u32,
}

impl ScoreParams {
    /// The full combo version of a score.
    pub fn if_fc(score: &Score) -> Self {
        Self {
            mode: score.mode(),
            mods: score.mods(),
            combo: score.beatmap.max_combo,
            accuracy: score.acc,
            misses: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Calculator {
    http: Client,
    cache_dir: PathBuf,
}

impl Calculator {
    pub fn new(http: Client, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            cache_dir: cache_dir.into(),
        }
    }

    fn map_path(&self, md5: &str) -> PathBuf {
        self.cache_dir.join(format!("{md5}.osu"))
    }

    /// Returns the path of the `.osu` file, downloading it if it isn't cached.
    pub async fn download(&self, beatmap_id: u64, md5: &str) -> Result<PathBuf, KselonError> {
        let path = self.map_path(md5);
        if tokio::fs::try_exists(&path).await? {
            return Ok(path);
        }

        tracing::debug!("Downloading beatmap {beatmap_id}.");
        let response = self
            .http
            .get(format!("https://osu.ppy.sh/osu/{beatmap_id}"))
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;

        let failed = || KselonError::Calculation {
            reason: format!("Failed to download beatmap with id {beatmap_id}"),
        };
        if !response.status().is_success() {
            return Err(failed());
        }

        let bytes = response.bytes().await?;
        if !is_beatmap_file(&bytes) {
            tracing::warn!("Beatmap {beatmap_id} download is not a .osu file, not caching it.");
            return Err(failed());
        }
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        Ok(path)
    }

    /// Stars and pp if FC of a score, rounded to 2 decimals.
    pub async fn calculate_score(&self, score: &Score) -> Result<MapCalculation, KselonError> {
        let beatmap = &score.beatmap;
        let path = self.download(beatmap.id, &beatmap.md5).await?;

        let params = ScoreParams::if_fc(score);
        let (stars, pp_if_fc) =
            tokio::task::spawn_blocking(move || calculate_file(&path, params)).await??;

        Ok(MapCalculation {
            pp: round2(score.pp),
            stars: round2(stars),
            pp_if_fc: round2(pp_if_fc),
        })
    }

    /// Number of beatmap files in the cache.
    pub async fn cached_count(&self) -> usize {
        let Ok(mut entries) = tokio::fs::read_dir(&self.cache_dir).await else {
            return 0;
        };

        let mut count = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.path().extension().is_some_and(|ext| ext == "osu") {
                count += 1;
            }
        }
        count
    }
}

/// Blocking, returns `(stars, pp)`.
fn calculate_file(path: &Path, params: ScoreParams) -> Result<(f64, f64), KselonError> {
    let map = Beatmap::from_path(path).map_err(|e| KselonError::Calculation {
        reason: format!("could not read {}: {e}", path.display()),
    })?;

    let attrs = Performance::new(&map)
        .mode_or_ignore(params.mode.ruleset())
        .mods(params.mods.with_implied().bits())
        .combo(params.combo)
        .accuracy(params.accuracy)
        .misses(params.misses)
        .calculate();

    let pp = attrs.pp();
    if !pp.is_finite() {
        return Err(KselonError::Calculation {
            reason: format!("got {pp}pp for {}", path.display()),
        });
    }

    Ok((attrs.stars(), pp))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether a download looks like a `.osu` file rather than an error page.
fn is_beatmap_file(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    bytes.trim_ascii_start().starts_with(b"osu file format")
}
