//! Implements the `help` command.

use itertools::Itertools;
use poise::CreateReply;
use serenity::CreateEmbed;
use tracing::instrument;

use crate::commands::Command;
use crate::serenity;
use crate::Context;
use crate::KselonError;

const MODE_ARGS: &str = "\nmode args: vn!std, vn!taiko, vn!mania, vn!ctb | rx!std, rx!taiko, rx!ctb, rx!mania (only for refx) | ap!std\
    \nargs accepts *vn* to *001* or *rx* to *002*";

/// Every visible command with its description, followed by the mode legend.
/// Commands sharing a name are listed once.
fn overview(commands: &[Command]) -> String {
    let mut text = "here are the commands available:\n".to_string();
    let lines = commands
        .iter()
        .filter(|cmd| !cmd.hide_in_help)
        .unique_by(|cmd| cmd.name.clone())
        .map(|cmd| format!("`{}`: {}\n", cmd.name, cmd.description.as_deref().unwrap_or("")))
        .collect::<String>();

    if lines.is_empty() {
        text.push_str("no commands available.");
    } else {
        text.push_str(&lines);
    }
    text.push_str(MODE_ARGS);
    text
}

fn command_help(cmd: &Command) -> String {
    let help = cmd
        .help_text
        .as_deref()
        .or(cmd.description.as_deref())
        .unwrap_or("");
    let mut text = format!("**{}**\n{help}\n", cmd.name);
    if !cmd.aliases.is_empty() {
        text.push_str(&format!("**aliases:** {}", cmd.aliases.join(", ")));
    }
    text
}

/// show this message, or the help of one command
#[instrument(skip(ctx))]
#[poise::command(prefix_command, slash_command, category = "util")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "A command name or alias"] command: Option<String>,
) -> Result<(), KselonError> {
    let commands = &ctx.framework().options().commands;

    let text = match command.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            match poise::find_command(commands, name, true, &mut vec![]) {
                Some((cmd, _, _)) => command_help(cmd),
                None => format!("no command called `{name}`."),
            }
        }
        _ => overview(commands),
    };

    let bot = ctx.cache().current_user().face();
    let embed = CreateEmbed::new()
        .title("help")
        .description(text)
        .colour(rand::random::<u32>() & 0xFFFFFF)
        .thumbnail(bot);
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::commands::util::info;
    use crate::commands::util::ping;

    #[test]
    fn overview_lists_commands_once() {
        let text = overview(&[ping(), info(), ping()]);

        assert_eq!(
            text,
            format!(
                "here are the commands available:\n`ping`: check the bot's latency\n`info`: get bot's info\n{MODE_ARGS}"
            )
        );
    }

    #[test]
    fn overview_without_commands() {
        assert!(overview(&[]).starts_with("here are the commands available:\nno commands available.\n"));
    }

    #[test]
    fn command_help_shows_aliases() {
        let mut cmd = ping();
        cmd.aliases = vec!["p".to_string(), "latency".to_string()];

        assert_eq!(
            command_help(&cmd),
            "**ping**\ncheck the bot's latency\n**aliases:** p, latency"
        );
    }
}
