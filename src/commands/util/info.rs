//! Implements the `info` command.

use std::fmt::Write;

use chrono::Utc;
use poise::CreateReply;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;
use tracing::instrument;

use super::ping::latency_ms;
use crate::lib;
use crate::serenity;
use crate::Context;
use crate::KselonError;

const INFO_COLOUR: u32 = 0x424549;

/// Memory of this process in MB and the usage of every core.
async fn system_usage(ctx: Context<'_>) -> (f64, Vec<f32>) {
    let mut system = ctx.data().system.lock().await;

    // Usage is measured between two refreshes.
    system.refresh_cpu();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    system.refresh_cpu();
    let cpus = system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();

    let memory = match sysinfo::get_current_pid() {
        Ok(pid) => {
            system.refresh_process(pid);
            system.process(pid).map_or(0, |process| process.memory())
        }
        Err(e) => {
            tracing::warn!("Could not find this process: {e}");
            0
        }
    };

    (memory as f64 / 1024.0 / 1024.0, cpus)
}

/// get bot's info
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "util")]
pub async fn info(ctx: Context<'_>) -> Result<(), KselonError> {
    ctx.defer().await?;
    let data = ctx.data();

    let started_at = data.started_at;
    let uptime = (Utc::now() - started_at).to_std().unwrap_or_default();
    let (memory, cpus) = system_usage(ctx).await;

    let mut info = format!(
        "online for: {}\nstarted at: {}\n\nmemory usage: {memory:.2} MB\n",
        lib::format_uptime(&uptime),
        lib::timestamp(started_at.timestamp(), 'F'),
    );
    for (i, usage) in cpus.iter().enumerate() {
        let _ = writeln!(info, "CPU core {}: {usage:.1}%", i + 1);
    }
    let _ = write!(
        info,
        "\nservers: {}\nbeatmaps cached: {}\nbot latency: {}ms\nversion: {}\n",
        ctx.cache().guild_count(),
        data.calculator.cached_count().await,
        latency_ms(ctx).await,
        env!("CARGO_PKG_VERSION"),
    );
    let repository = env!("CARGO_PKG_REPOSITORY");
    if !repository.is_empty() {
        let _ = write!(info, "\n**[source code]({repository})**\n");
    }

    let bot = ctx.cache().current_user().clone();
    let embed = CreateEmbed::new()
        .title(format!("{}'s info", bot.name))
        .description(info)
        .colour(INFO_COLOUR)
        .thumbnail(bot.face())
        .footer(CreateEmbedFooter::new(format!("running on {}", data.osu.server())));

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
