//! Error types used throughout the bot.
//!
//! [UserError] is for expected failures that are shown to the user as is.
//! Everything else is unexpected and ends up in the logs (and bug notifications).

use std::time::Duration;

use thiserror::Error;

use crate::serenity;

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum KselonError {
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("discord error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("chat provider error: {reason}")]
    ChatProvider { reason: String },

    #[error("pp calculation failed: {reason}")]
    Calculation { reason: String },

    #[error("command panicked: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },

    #[error("check failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },

    #[error("command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },

    #[error("missing from setup: {reason}")]
    MissingFromSetup { reason: String },
}

/// Errors caused by how the bot was used. Their message is the reply.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("This command only works in a server.")]
    GuildOnly,

    #[error("This command only works in DMs.")]
    DmOnly,

    #[error("This command only works in NSFW channels.")]
    NsfwOnly,

    #[error("{motd}")]
    NotOwner { motd: String },

    #[error("This command needs a subcommand: {subcmds}")]
    MissingSubcommand { subcmds: String },

    #[error("Couldn't understand `{}`.", .input.as_deref().unwrap_or(""))]
    BadArgs { input: Option<String> },

    #[error("Slow down! Try again in {}s.", .remaining_cooldown.as_secs())]
    OnCooldown { remaining_cooldown: Duration },

    #[error("I'm missing these permissions: {missing_permissions}")]
    MissingBotPermissions {
        missing_permissions: serenity::Permissions,
    },

    #[error("You need these permissions: {}", .missing_permissions.map(|p| p.to_string()).unwrap_or_default())]
    MissingUserPermissions {
        missing_permissions: Option<serenity::Permissions>,
    },

    #[error("Prefix must be 3 characters or less!")]
    PrefixTooLong,

    #[error("you must provide both an username and a mode: `!setprofile <username> <mode>`")]
    MissingProfileArgs,

    #[error("no profile set. Use `!setprofile <name> (mode)` to set a default profile.")]
    NoProfile,

    #[error("user <@{user}> not found in the database.")]
    MentionNotFound { user: serenity::UserId },

    #[error("{name} not found in {server}")]
    PlayerNotFound { name: String, server: String },

    #[error("no stats available for the specified mode.")]
    NoModeStats,

    #[error("failed to fetch scores.")]
    ScoresUnavailable,

    #[error("no {scope} scores found.")]
    NoScores { scope: String },

    #[error("Please attach a .osr file.")]
    MissingReplay,

    #[error("Please attach a valid .osr file.")]
    NotAReplay,

    #[error("Please specify mods to apply.")]
    MissingMods,

    #[error("Unknown mod '{chunk}' in '{input}'")]
    UnknownMod { chunk: String, input: String },

    #[error("error processing replay: {reason}")]
    InvalidReplay { reason: String },

    #[error("you must provide an username!")]
    MissingLastFmName,

    #[error("you must provide an username!, to set lastfm username: `!setlastfm <username>`")]
    NoLastFmProfile,

    #[error("couldn't find any recent tracks for user: {username}")]
    NoRecentTracks { username: String },

    #[error("there's a game already in progress in this server!")]
    GameInProgress,

    #[error("time limit must be between 1 and {max} seconds.")]
    InvalidTimeLimit { max: u64 },

    #[error("No PP rework data found.")]
    NoReworkData,

    #[error("could not find guild with ID: {id}")]
    GuildNotFound { id: u64 },
}

/// Errors while reading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },

    #[error("Could not access config file: {0}")]
    IoError(std::io::Error),
}
