//! This module contains everything relating to [Data].

mod health;
#[cfg(test)]
mod memory;
mod mysql;
mod store;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use rand::seq::SliceRandom;
use serenity::GuildId;
use serenity::RoleId;
use serenity::UserId;
use sysinfo::System;
use tokio::sync::Mutex;

use crate::chat::Chat;
use crate::lastfm::LastFm;
use crate::osu::api::OsuApi;
use crate::osu::calc::Calculator;
use crate::reworks::Reworks;
use crate::serenity;
use crate::wordbomb::Dictionary;
use crate::wordbomb::GameSlots;
pub use health::spawn_health_check;
#[cfg(test)]
pub use memory::MemoryStore;
pub use mysql::MySqlStore;
pub use store::prefix_for;
pub use store::validate_prefix;
pub use store::Profile;
pub use store::Store;
pub use store::DEFAULT_PREFIX;

/// Said to non-owners trying owner commands when no lines are configured.
const FALLBACK_MOTD: &str = "you're not my owner!";

/// The data kept between shards
#[derive(Debug)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Lines for non-owners using owner commands.
    pub owner_check_motd: Vec<String>,
    /// Prefixes and linked profiles.
    pub store: Arc<dyn Store>,
    pub osu: OsuApi,
    pub calculator: Calculator,
    pub lastfm: LastFm,
    pub reworks: Reworks,
    pub chat: Chat,
    /// Words already checked by word bomb games.
    pub dictionary: Dictionary,
    /// Guilds with a word bomb game running.
    pub wordbomb: GameSlots,
    pub started_at: DateTime<Utc>,
    /// Kept between `info` calls, cpu usage is measured between two refreshes.
    pub system: Mutex<System>,
    /// Role given to every member of a guild.
    pub auto_role: Option<(GuildId, RoleId)>,
}

impl Data {
    /// A random line of [Data::owner_check_motd].
    pub fn owner_check_reply(&self) -> String {
        self.owner_check_motd
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_MOTD.to_string())
    }
}
