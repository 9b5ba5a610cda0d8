//! Bot commands, grouped like the categories shown in `help`.

mod fun;
mod general;
mod guilds;
mod osu;
mod util;

use crate::Data;
use crate::KselonError;

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, KselonError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        // guilds
        guilds::setprefix(),
        guilds::prefix(),
        guilds::resetprefix(),
        // general
        general::userinfo(),
        general::avatar(),
        // util
        util::ping(),
        util::info(),
        util::help(),
        util::shutdown(),
        util::guilds(),
        util::leaveguild(),
        // osu
        osu::setprofile(),
        osu::profile(),
        osu::recent(),
        osu::top(),
        osu::changemod(),
        // fun, the prefix `chat` has to come before the slash one to be found.
        fun::chat_prefix(),
        fun::chat_slash(),
        fun::switch(),
        fun::resetai(),
        fun::wordbomb(),
        fun::setlastfm(),
        fun::nowplaying(),
        fun::reworks(),
    ]
}
