//! Chatting with kselon.

use serenity::Attachment;
use tracing::instrument;

use crate::chat::ChatRequest;
use crate::chat::Origin;
use crate::chat::Persona;
use crate::chat::TextAttachment;
use crate::serenity;
use crate::Context;
use crate::KselonError;

/// Reads a `.txt` attachment. Other files are ignored.
async fn read_text_attachment(
    attachment: Option<&Attachment>,
) -> Result<Option<TextAttachment>, KselonError> {
    let Some(attachment) = attachment.filter(|a| a.filename.ends_with(".txt")) else {
        return Ok(None);
    };

    let bytes = attachment.download().await?;
    Ok(Some(TextAttachment {
        filename: attachment.filename.clone(),
        content: String::from_utf8_lossy(&bytes).into_owned(),
    }))
}

/// chat with kselon!
///
/// usage: `!chat hello`, a `.txt` file can be attached.
#[instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "chat", category = "fun")]
pub async fn chat_prefix(
    ctx: Context<'_>,
    #[rest] message: String,
) -> Result<(), KselonError> {
    ctx.defer().await?;

    let attachment = match ctx {
        poise::Context::Prefix(prefix) => {
            read_text_attachment(prefix.msg.attachments.first()).await?
        }
        poise::Context::Application(_) => None,
    };

    ctx.data().chat.enqueue(ChatRequest {
        author: ctx.author().name.clone(),
        channel: ctx.channel_id(),
        text: message,
        attachment,
        origin: Origin::Prefix,
    })
}

/// chat with kselon!
#[instrument(skip(ctx, attachment))]
#[poise::command(slash_command, rename = "chat", category = "fun")]
pub async fn chat_slash(
    ctx: Context<'_>,
    #[description = "What to say"] message: String,
    #[description = "A .txt file to read"] attachment: Option<Attachment>,
    #[description = "Only you can see the answer"] ephemeral: Option<bool>,
) -> Result<(), KselonError> {
    let ephemeral = ephemeral.unwrap_or(false);
    if ephemeral {
        ctx.defer_ephemeral().await?;
    } else {
        ctx.defer().await?;
    }

    let poise::Context::Application(app) = ctx else {
        return Ok(());
    };
    let attachment = read_text_attachment(attachment.as_ref()).await?;

    ctx.data().chat.enqueue(ChatRequest {
        author: ctx.author().name.clone(),
        channel: ctx.channel_id(),
        text: message,
        attachment,
        origin: Origin::Slash {
            interaction: Box::new(app.interaction.clone()),
            ephemeral,
        },
    })
}

/// switches how kselon talks
#[instrument(skip(ctx))]
#[poise::command(slash_command, category = "fun")]
pub async fn switch(
    ctx: Context<'_>,
    #[description = "Who kselon should be"] prompt: Persona,
) -> Result<(), KselonError> {
    ctx.defer().await?;
    let chat = &ctx.data().chat;

    let answer = chat.switch(prompt).await?;
    ctx.say(format!("switched to {}!", prompt.display_name()))
        .await?;
    chat.post_to_prompt_channel(ctx.http(), &answer).await
}

/// Resets the AI's brain
#[instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    slash_command,
    aliases("rst", "reset"),
    category = "fun"
)]
pub async fn resetai(ctx: Context<'_>) -> Result<(), KselonError> {
    ctx.defer().await?;
    let chat = &ctx.data().chat;

    chat.reset().await;
    match chat.send_start_prompt().await {
        Ok(Some(answer)) => chat.post_to_prompt_channel(ctx.http(), &answer).await?,
        Ok(None) => {}
        Err(e) => tracing::error!("Error while sending the start prompt: {e}"),
    }

    ctx.say("DONE :rofl: :rofl: :rofl: :rofl:").await?;
    Ok(())
}
