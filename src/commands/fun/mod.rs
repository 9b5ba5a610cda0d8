//! Commands that are just for fun.

mod ai;
mod lastfm;
mod rework;
mod wordbomb;

pub use ai::chat_prefix;
pub use ai::chat_slash;
pub use ai::resetai;
pub use ai::switch;
pub use lastfm::nowplaying;
pub use lastfm::setlastfm;
pub use rework::reworks;
pub use wordbomb::wordbomb;
