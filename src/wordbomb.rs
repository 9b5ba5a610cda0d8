//! Rules and state of the word bomb game.
//!
//! Players race to send an english word sharing at least two letters in a row
//! with the current word. The longer the word, the more points it's worth, and
//! a valid word becomes the next current word.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::StatusCode;
use serenity::GuildId;
use serenity::UserId;
use tokio::time::Instant;

use crate::error::UserError;
use crate::serenity;

/// Starting words.
pub const COMMON_WORDS: [&str; 34] = [
    "time", "play", "game", "word", "make", "like", "just", "know", "take", "people", "year",
    "good", "some", "them", "see", "other", "than", "then", "look", "only", "come", "over",
    "think", "also", "back", "after", "work", "first", "well", "even", "want", "give", "most",
    "find",
];

/// Letters in a row a word must share with the current one.
pub const MIN_SEQUENCE: usize = 2;

/// Longest game that can be started, in seconds.
pub const MAX_TIME_LIMIT: u64 = 3600;

const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
const DICTIONARY_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks a time limit given in seconds.
pub fn check_time_limit(secs: u64) -> Result<Duration, UserError> {
    if (1..=MAX_TIME_LIMIT).contains(&secs) {
        Ok(Duration::from_secs(secs))
    } else {
        Err(UserError::InvalidTimeLimit { max: MAX_TIME_LIMIT })
    }
}

pub fn random_word() -> &'static str {
    COMMON_WORDS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("game")
}

/// Whether `word` contains `min_len` or more letters in a row of `target`, ignoring case.
pub fn contains_sequence(target: &str, word: &str, min_len: usize) -> bool {
    let target: Vec<char> = target.to_lowercase().chars().collect();
    let word = word.to_lowercase();

    // Every longer sequence contains one of the shortest ones.
    target
        .windows(min_len.max(1))
        .any(|window| word.contains(&window.iter().collect::<String>()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Player {
    name: String,
    points: u32,
}

/// One running game.
#[derive(Debug)]
pub struct Game {
    current_word: String,
    used_words: HashSet<String>,
    scores: HashMap<UserId, Player>,
    ends_at: Instant,
}

impl Game {
    /// Games last at most [MAX_TIME_LIMIT] seconds.
    pub fn new(first_word: &str, time_limit: Duration) -> Self {
        let first_word = first_word.to_lowercase();
        let now = Instant::now();
        let time_limit = time_limit.min(Duration::from_secs(MAX_TIME_LIMIT));
        Self {
            used_words: HashSet::from([first_word.clone()]),
            current_word: first_word,
            scores: HashMap::new(),
            ends_at: now.checked_add(time_limit).unwrap_or(now),
        }
    }

    pub fn current_word(&self) -> &str {
        &self.current_word
    }

    pub fn remaining(&self) -> Duration {
        self.ends_at.saturating_duration_since(Instant::now())
    }

    /// The word a message plays, if it could be a valid move.
    /// It still needs to be checked against the dictionary.
    pub fn candidate(&self, content: &str) -> Option<String> {
        candidate(content, &self.current_word, &self.used_words)
    }

    /// A snapshot of what [Game::candidate] needs, for message filters.
    pub fn rules(&self) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let current = self.current_word.clone();
        let used = self.used_words.clone();
        move |content| candidate(content, &current, &used)
    }

    /// Scores a valid word, which becomes the current word. Returns the points earned.
    pub fn accept(&mut self, player: UserId, name: &str, word: &str) -> u32 {
        let word = word.to_lowercase();
        let points = u32::try_from(word.chars().count()).unwrap_or(u32::MAX);

        let entry = self.scores.entry(player).or_insert_with(|| Player {
            name: name.to_string(),
            points: 0,
        });
        entry.points += points;

        self.used_words.insert(word.clone());
        self.current_word = word;
        points
    }

    /// Names and points, best first.
    pub fn standings(&self) -> Vec<(String, u32)> {
        let mut standings: Vec<_> = self
            .scores
            .values()
            .map(|player| (player.name.clone(), player.points))
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        standings
    }

    /// The message kept up to date during the game.
    pub fn status(&self) -> String {
        let mut status = format!(
            "current word: **{}**\ntime remaining: **{}s**\n\ncurrent scores:\n",
            self.current_word,
            self.remaining().as_secs()
        );

        let standings = self.standings();
        if standings.is_empty() {
            status.push_str("no scores yet!");
        } else {
            let lines: Vec<_> = standings
                .iter()
                .map(|(name, points)| format!("{name}: {points}"))
                .collect();
            status.push_str(&lines.join("\n"));
        }
        status
    }

    pub fn final_board(&self) -> String {
        final_board(&self.standings())
    }
}

fn candidate(content: &str, current: &str, used: &HashSet<String>) -> Option<String> {
    let word = content.trim();
    if word.is_empty() || !word.chars().all(char::is_alphabetic) {
        return None;
    }

    let word = word.to_lowercase();
    if used.contains(&word) || !contains_sequence(current, &word, MIN_SEQUENCE) {
        return None;
    }
    Some(word)
}

/// The last message of a game. `standings` are sorted, best first.
pub fn final_board(standings: &[(String, u32)]) -> String {
    let mut board = String::from("**game over!**\n\nfinal scores:\n");
    if standings.is_empty() {
        board.push_str("no one scored any points! :(");
        return board;
    }

    for (i, (name, points)) in standings.iter().enumerate() {
        let medal = match i {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "➖",
        };
        board.push_str(&format!("{medal} {name}: {points} points\n"));
    }
    board
}

/// Checks words against a free dictionary, remembering the ones that exist.
#[derive(Debug)]
pub struct Dictionary {
    http: Client,
    known: Mutex<HashSet<String>>,
}

impl Dictionary {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            known: Mutex::default(),
        }
    }

    fn is_known(&self, word: &str) -> bool {
        self.known
            .lock()
            .map(|known| known.contains(word))
            .unwrap_or(false)
    }

    fn remember(&self, word: &str) {
        if let Ok(mut known) = self.known.lock() {
            known.insert(word.to_string());
        }
    }

    /// Failed lookups count as not a word.
    pub async fn is_english_word(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        if self.is_known(&word) {
            return true;
        }

        let response = self
            .http
            .get(format!("{DICTIONARY_URL}/{word}"))
            .timeout(DICTIONARY_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::OK => {
                self.remember(&word);
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::debug!("Dictionary lookup of {word} failed: {e}");
                false
            }
        }
    }
}

/// Guilds with a game in progress.
#[derive(Debug, Default)]
pub struct GameSlots {
    active: Mutex<HashSet<GuildId>>,
}

/// Holds the slot of a guild, freeing it when dropped.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slots: &'a GameSlots,
    guild: GuildId,
}

impl GameSlots {
    /// `None` if the guild already has a game.
    pub fn try_claim(&self, guild: GuildId) -> Option<SlotGuard<'_>> {
        let mut active = self.active.lock().ok()?;
        active.insert(guild).then_some(SlotGuard { slots: self, guild })
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        match self.slots.active.lock() {
            Ok(mut active) => {
                active.remove(&self.guild);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&self.guild);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sequences_are_shared_letters_in_a_row() {
        assert!(contains_sequence("game", "same", 2));
        assert!(contains_sequence("GAME", "mega", 2));
        assert!(contains_sequence("time", "metric", 2));
        assert!(!contains_sequence("time", "bat", 2));
        // Shared letters that aren't next to each other don't count.
        assert!(!contains_sequence("tame", "meat", 3));
        assert!(!contains_sequence("a", "a", 2));
    }

    #[test]
    fn candidates() {
        let game = Game::new("Game", Duration::from_secs(60));

        assert_eq!(game.candidate(" Gamer "), Some("gamer".to_string()));
        assert_eq!(game.candidate("game"), None);
        assert_eq!(game.candidate("game2"), None);
        assert_eq!(game.candidate("two words"), None);
        assert_eq!(game.candidate("zzz"), None);
        assert_eq!(game.candidate(""), None);
        assert_eq!(game.rules()("amen"), Some("amen".to_string()));
    }

    #[test]
    fn accepted_words_score_their_length() {
        let mut game = Game::new("game", Duration::from_secs(60));
        let ano = UserId::new(1);
        let rieki = UserId::new(2);

        assert_eq!(game.accept(ano, "ano", "gamer"), 5);
        assert_eq!(game.current_word(), "gamer");
        assert_eq!(game.candidate("gamer"), None);

        game.accept(rieki, "rieki", "merge");
        game.accept(ano, "ano", "erg");

        assert_eq!(
            game.standings(),
            [("ano".to_string(), 8), ("rieki".to_string(), 5)]
        );
    }

    #[test]
    fn final_board_has_medals() {
        let standings = [
            ("a".to_string(), 9),
            ("b".to_string(), 7),
            ("c".to_string(), 5),
            ("d".to_string(), 2),
        ];

        assert_eq!(
            final_board(&standings),
            "**game over!**\n\nfinal scores:\n\
             🥇 a: 9 points\n🥈 b: 7 points\n🥉 c: 5 points\n➖ d: 2 points\n"
        );
        assert_eq!(
            final_board(&[]),
            "**game over!**\n\nfinal scores:\nno one scored any points! :("
        );
    }

    #[tokio::test(start_paused = true)]
    async fn status_counts_down() {
        let mut game = Game::new("word", Duration::from_secs(30));
        assert_eq!(
            game.status(),
            "current word: **word**\ntime remaining: **30s**\n\ncurrent scores:\nno scores yet!"
        );

        tokio::time::advance(Duration::from_secs(12)).await;
        game.accept(UserId::new(1), "ano", "sword");
        assert_eq!(
            game.status(),
            "current word: **sword**\ntime remaining: **18s**\n\ncurrent scores:\nano: 5"
        );

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(game.remaining(), Duration::ZERO);
    }

    #[test]
    fn time_limits_are_bounded() {
        assert_eq!(check_time_limit(32).unwrap(), Duration::from_secs(32));
        assert_eq!(
            check_time_limit(MAX_TIME_LIMIT).unwrap(),
            Duration::from_secs(3600)
        );
        assert!(matches!(
            check_time_limit(0),
            Err(UserError::InvalidTimeLimit { max: 3600 })
        ));
        assert_eq!(
            check_time_limit(u64::MAX).unwrap_err().to_string(),
            "time limit must be between 1 and 3600 seconds."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn huge_time_limits_are_capped() {
        let game = Game::new("word", Duration::from_secs(u64::MAX));

        assert_eq!(game.remaining(), Duration::from_secs(MAX_TIME_LIMIT));
    }

    #[test]
    fn one_game_per_guild() {
        let slots = GameSlots::default();
        let guild = GuildId::new(1);

        let claimed = slots.try_claim(guild);
        assert!(claimed.is_some());
        assert!(slots.try_claim(guild).is_none());
        assert!(slots.try_claim(GuildId::new(2)).is_some());

        drop(claimed);
        assert!(slots.try_claim(guild).is_some());
    }

    #[test]
    fn random_words_are_common() {
        assert!(COMMON_WORDS.contains(&random_word()));
    }
}
