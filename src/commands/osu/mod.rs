//! osu! commands for bancho.py based servers.

mod profile;
mod score;
mod tools;

pub use profile::profile;
pub use profile::setprofile;
pub use score::recent;
pub use score::top;
pub use tools::changemod;

use crate::data::Store;
use crate::osu::args;
use crate::osu::Mode;
use crate::Context;
use crate::KselonError;

/// Whose profile or scores a command is about, from its argument and mentions.
async fn resolve_player(
    ctx: Context<'_>,
    args: Option<&str>,
) -> Result<(String, Mode), KselonError> {
    let mention = args::first_mention(args, ctx.framework().bot_id);
    let store: &dyn Store = ctx.data().store.as_ref();
    args::resolve(store, ctx.author().id, mention, args).await
}
