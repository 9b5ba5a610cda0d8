//! Implements the `ping` command.

use tracing::instrument;

use crate::osu::calc::round2;
use crate::Context;
use crate::KselonError;

/// Heartbeat latency of the shard in milliseconds, `0` before the first heartbeat.
pub async fn latency_ms(ctx: Context<'_>) -> f64 {
    round2(ctx.ping().await.as_secs_f64() * 1000.0)
}

/// check the bot's latency
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "util")]
pub async fn ping(ctx: Context<'_>) -> Result<(), KselonError> {
    let latency = latency_ms(ctx).await;
    ctx.say(format!("pong! latency: {latency}ms")).await?;
    Ok(())
}
