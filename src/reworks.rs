//! Results of pp reworks, computed by a separate calculation service.
//!
//! The service answers `GET /calculate_pp` with the top scores of every player,
//! each with its old and recalculated pp.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serenity::ButtonStyle;
use serenity::Colour;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;

use crate::lib::paginate::page_count;
use crate::lib::paginate::Nav;
use crate::lib::paginate::Pager;
use crate::osu::Mods;
use crate::serenity;
use crate::KselonError;

const TIMEOUT: Duration = Duration::from_secs(15);

/// Players or scores per page.
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ReworkMode {
    #[name = "std!01"]
    Vanilla,
    #[name = "std!02"]
    Relax,
}

impl ReworkMode {
    fn id(self) -> u8 {
        match self {
            ReworkMode::Vanilla => 0,
            ReworkMode::Relax => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Version {
    #[name = "Vanilla Calculation"]
    Vanilla,
    #[name = "osu_2019 Calculation"]
    Osu2019,
    #[name = "osu_2019_ScoreV2 Calculation"]
    Osu2019ScoreV2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Branch {
    #[name = "deployed-pp (current)"]
    Deployed,
    #[name = "main-with-cheats"]
    MainWithCheats,
    #[name = "main-without-cheats"]
    MainWithoutCheats,
    #[name = "if-servers-legit"]
    IfServersLegit,
}

/// What to ask the service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReworkQuery {
    pub mode: ReworkMode,
    pub version: Version,
    pub branch: Branch,
    /// Only matters for relax.
    pub relax: bool,
}

impl ReworkQuery {
    fn params(&self) -> [(&'static str, String); 4] {
        [
            ("mode", self.mode.id().to_string()),
            ("version", (self.version as u8).to_string()),
            ("branch", (self.branch as u8).to_string()),
            ("rx", self.relax.to_string()),
        ]
    }

    fn description(&self) -> String {
        format!(
            "Mode: {} | Version: {} | Branch: {}",
            self.mode.id(),
            self.version as u8,
            self.branch as u8
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReworkScore {
    #[serde(default)]
    pub beatmap_id: Option<u64>,
    #[serde(default)]
    pub original_pp: f64,
    #[serde(default)]
    pub recalculated_pp: f64,
    #[serde(default)]
    pub difference: f64,
    #[serde(default)]
    pub mods: u32,
}

/// Players with their scores, highest total recalculated pp first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReworkResults {
    pub query: ReworkQuery,
    pub players: Vec<(String, Vec<ReworkScore>)>,
}

impl ReworkResults {
    pub fn new(query: ReworkQuery, players: HashMap<String, Vec<ReworkScore>>) -> Self {
        let total = |scores: &[ReworkScore]| scores.iter().map(|s| s.recalculated_pp).sum::<f64>();

        let mut players: Vec<_> = players.into_iter().collect();
        players.sort_by(|(a_name, a), (b_name, b)| {
            total(b)
                .total_cmp(&total(a))
                .then_with(|| a_name.cmp(b_name))
        });
        Self { query, players }
    }

    /// Index of a player, by exact name ignoring case.
    pub fn find_player(&self, name: &str) -> Option<usize> {
        let name = name.trim().to_lowercase();
        self.players
            .iter()
            .position(|(player, _)| player.to_lowercase() == name)
    }
}

/// One line about a player's scores.
pub fn summarize(scores: &[ReworkScore]) -> String {
    if scores.is_empty() {
        return "No scores found".to_string();
    }

    let max_original = scores.iter().map(|s| s.original_pp).fold(f64::MIN, f64::max);
    let max_recalculated = scores
        .iter()
        .map(|s| s.recalculated_pp)
        .fold(f64::MIN, f64::max);
    let total_diff: f64 = scores.iter().map(|s| s.difference).sum();
    let avg_diff = total_diff / scores.len() as f64;

    // The first of the biggest changes, in either direction.
    let mut worst = &scores[0];
    for score in &scores[1..] {
        if score.difference.abs() > worst.difference.abs() {
            worst = score;
        }
    }
    let worst_id = worst
        .beatmap_id
        .map_or_else(|| "N/A".to_string(), |id| id.to_string());

    format!(
        "#1 {max_original:.2}pp ~ #1 re: {max_recalculated:.2}pp ~ %: {total_diff:.2}pp ~ ={avg_diff:.2}pp= ~ ^{:.2}pp^ ~ (ID: {worst_id})",
        worst.difference
    )
}

#[derive(Debug, Clone)]
pub struct Reworks {
    http: Client,
    url: String,
}

impl Reworks {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn calculate(&self, query: ReworkQuery) -> Result<ReworkResults, KselonError> {
        let url = format!("{}/calculate_pp", self.url.trim_end_matches('/'));
        tracing::debug!("Requesting pp reworks: {query:?}");

        let players: HashMap<String, Vec<ReworkScore>> = self
            .http
            .get(url)
            .query(&query.params())
            .timeout(TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ReworkResults::new(query, players))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Overview,
    Details { player: usize },
}

/// Browses the results: an overview of every player, or the scores of one.
#[derive(Debug, Clone)]
pub struct Browser {
    results: ReworkResults,
    view: View,
    pager: Pager,
}

/// Suffix of the custom id of the details button.
pub const DETAILS_ID: &str = "details";
/// Suffix of the custom id of the back button.
pub const BACK_ID: &str = "back";

impl Browser {
    pub fn new(results: ReworkResults) -> Self {
        let pager = Pager::new(page_count(results.players.len(), PAGE_SIZE));
        Self {
            results,
            view: View::Overview,
            pager,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.players.is_empty()
    }

    pub fn turn(&mut self, nav: Nav) {
        self.pager.apply(nav);
    }

    /// Shows the scores of a player. A player that doesn't exist is returned as the error.
    pub fn open(&mut self, name: String) -> Result<(), String> {
        let player = self.results.find_player(&name).ok_or(name)?;
        let scores = self.results.players[player].1.len();
        self.view = View::Details { player };
        self.pager = Pager::new(page_count(scores, PAGE_SIZE));
        Ok(())
    }

    /// Back to the overview, on its first page.
    pub fn back(&mut self) {
        self.view = View::Overview;
        self.pager = Pager::new(page_count(self.results.players.len(), PAGE_SIZE));
    }

    pub fn embed(&self) -> CreateEmbed {
        let page = self.pager.page();
        let description = self.results.query.description();

        match self.view {
            View::Overview => {
                // The first page gets a random colour.
                let colour = if page == 0 {
                    Colour::new(rand::random::<u32>() & 0xFFFFFF)
                } else {
                    Colour::BLUE
                };
                let fields = self
                    .results
                    .players
                    .iter()
                    .skip(page * PAGE_SIZE)
                    .take(PAGE_SIZE)
                    .map(|(name, scores)| (format!(" - {name}"), summarize(scores), false));

                CreateEmbed::new()
                    .title("PP Rework Results")
                    .description(description)
                    .colour(colour)
                    .fields(fields)
            }
            View::Details { player } => {
                let (name, scores) = &self.results.players[player];
                let title = if page == 0 {
                    format!("Top Scores for {name}")
                } else {
                    format!("Detailed Scores for {name}")
                };
                let fields = scores
                    .iter()
                    .skip(page * PAGE_SIZE)
                    .take(PAGE_SIZE)
                    .map(|score| (score_name(score), score_details(score), false));

                CreateEmbed::new()
                    .title(title)
                    .description(description)
                    .colour(Colour::DARK_GREEN)
                    .fields(fields)
            }
        }
    }

    /// ◀️ ^ ▶️ on the overview, ◀️ - ▶️ on a player.
    pub fn buttons(&self, session: &str) -> CreateActionRow {
        let arrow = |nav: Nav, label: &str, disabled: bool| {
            CreateButton::new(nav.custom_id(session))
                .label(label)
                .style(ButtonStyle::Secondary)
                .disabled(disabled)
        };
        let middle = match self.view {
            View::Overview => CreateButton::new(format!("{session}_{DETAILS_ID}"))
                .label("^")
                .style(ButtonStyle::Primary),
            View::Details { .. } => CreateButton::new(format!("{session}_{BACK_ID}"))
                .label("-")
                .style(ButtonStyle::Secondary),
        };

        CreateActionRow::Buttons(vec![
            arrow(Nav::Previous, "◀️", self.pager.at_start()),
            middle,
            arrow(Nav::Next, "▶️", self.pager.at_end()),
        ])
    }
}

fn score_name(score: &ReworkScore) -> String {
    score
        .beatmap_id
        .map_or_else(|| "N/A".to_string(), |id| id.to_string())
}

fn score_details(score: &ReworkScore) -> String {
    format!(
        "{}pp ~ re: {}pp | ({:.2}pp)\n +{}",
        score.original_pp,
        score.recalculated_pp,
        score.difference,
        Mods::from_bits(score.mods).to_acronyms()
    )
}
