//! Utility commands: latency, bot info, help and owner tools.

mod help;
mod info;
mod owner;
mod ping;

pub use help::help;
pub use info::info;
pub use owner::guilds;
pub use owner::leaveguild;
pub use owner::shutdown;
pub use ping::ping;
