//! Everything osu!: the server API, beatmap calculations, replays and how scores are shown.

pub mod api;
pub mod args;
pub mod calc;
pub mod embeds;
mod mode;
mod mods;
pub mod replay;

pub use mode::Mode;
pub use mods::Mods;
