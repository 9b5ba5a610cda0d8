//! Implements the `reworks` command.

use poise::CreateReply;
use serenity::ActionRow;
use serenity::ActionRowComponent;
use serenity::ComponentInteraction;
use serenity::ComponentInteractionCollector;
use serenity::CreateActionRow;
use serenity::CreateInputText;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;
use serenity::CreateModal;
use serenity::InputTextStyle;
use serenity::ModalInteractionCollector;
use tracing::instrument;

use crate::error::UserError;
use crate::lib::paginate::Nav;
use crate::lib::paginate::IDLE_TIMEOUT;
use crate::reworks::Branch;
use crate::reworks::Browser;
use crate::reworks::ReworkMode;
use crate::reworks::ReworkQuery;
use crate::reworks::Version;
use crate::reworks::BACK_ID;
use crate::reworks::DETAILS_ID;
use crate::serenity;
use crate::Context;
use crate::KselonError;

const USERNAME_ID: &str = "username";

/// The button a custom id stands for, if it belongs to `session`.
fn button_action(session: &str, custom_id: &str) -> Option<Button> {
    if let Some(nav) = Nav::from_custom_id(session, custom_id) {
        return Some(Button::Nav(nav));
    }
    match custom_id.strip_prefix(session)?.strip_prefix('_')? {
        DETAILS_ID => Some(Button::Details),
        BACK_ID => Some(Button::Back),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    Nav(Nav),
    Details,
    Back,
}

/// The text typed in the username field of the modal.
fn typed_username(rows: &[ActionRow]) -> Option<String> {
    rows.iter()
        .flat_map(|row| &row.components)
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == USERNAME_ID => {
                input.value.clone()
            }
            _ => None,
        })
}

fn username_modal(custom_id: &str) -> CreateModal {
    let input = CreateInputText::new(InputTextStyle::Short, "Username", USERNAME_ID)
        .placeholder("Enter the exact username from the results")
        .required(true);
    CreateModal::new(custom_id, "Player Details")
        .components(vec![CreateActionRow::InputText(input)])
}

fn update(browser: &Browser, session: &str) -> CreateInteractionResponse {
    CreateInteractionResponse::UpdateMessage(
        CreateInteractionResponseMessage::new()
            .embed(browser.embed())
            .components(vec![browser.buttons(session)]),
    )
}

/// Asks for a username and opens the scores of that player.
async fn open_details(
    ctx: Context<'_>,
    press: &ComponentInteraction,
    browser: &mut Browser,
    session: &str,
) -> Result<(), KselonError> {
    let modal_id = format!("{session}_modal");
    press
        .create_response(ctx, CreateInteractionResponse::Modal(username_modal(&modal_id)))
        .await?;

    let Some(submit) = ModalInteractionCollector::new(ctx)
        .custom_ids(vec![modal_id])
        .timeout(IDLE_TIMEOUT)
        .await
    else {
        return Ok(());
    };

    let name = typed_username(&submit.data.components).unwrap_or_default();
    let response = match browser.open(name) {
        Ok(()) => update(browser, session),
        Err(name) => CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(format!("No player found matching '{name}'."))
                .ephemeral(true),
        ),
    };
    submit.create_response(ctx, response).await?;
    Ok(())
}

/// show pp rework results
#[instrument(skip(ctx))]
#[poise::command(slash_command, category = "fun")]
pub async fn reworks(
    ctx: Context<'_>,
    #[description = "Select the game mode"] mode: ReworkMode,
    #[description = "Select the calculation version"] version: Version,
    #[description = "Select the branch"] branch: Branch,
    #[description = "Use relax calculation"] relax: Option<bool>,
) -> Result<(), KselonError> {
    ctx.defer().await?;

    let query = ReworkQuery {
        mode,
        version,
        branch,
        relax: relax.unwrap_or(false),
    };
    let mut browser = Browser::new(ctx.data().reworks.calculate(query).await?);
    if browser.is_empty() {
        return Err(UserError::NoReworkData.into());
    }

    let session = ctx.id().to_string();
    let handle = ctx
        .send(
            CreateReply::default()
                .embed(browser.embed())
                .components(vec![browser.buttons(&session)]),
        )
        .await?;

    let filter_session = session.clone();
    while let Some(press) = ComponentInteractionCollector::new(ctx)
        .filter({
            let filter_session = filter_session.clone();
            move |press| press.data.custom_id.starts_with(&filter_session)
        })
        .timeout(IDLE_TIMEOUT)
        .await
    {
        match button_action(&session, &press.data.custom_id) {
            Some(Button::Nav(nav)) => {
                browser.turn(nav);
                press.create_response(ctx, update(&browser, &session)).await?;
            }
            Some(Button::Back) => {
                browser.back();
                press.create_response(ctx, update(&browser, &session)).await?;
            }
            Some(Button::Details) => open_details(ctx, &press, &mut browser, &session).await?,
            None => {}
        }
    }

    let last = CreateReply::default()
        .embed(browser.embed())
        .components(vec![]);
    if let Err(e) = handle.edit(ctx, last).await {
        tracing::debug!("Could not remove the rework buttons: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn buttons_of_a_session() {
        assert_eq!(button_action("9", "9_next"), Some(Button::Nav(Nav::Next)));
        assert_eq!(button_action("9", "9_details"), Some(Button::Details));
        assert_eq!(button_action("9", "9_back"), Some(Button::Back));
        assert_eq!(button_action("9", "9_modal"), None);
        assert_eq!(button_action("9", "8_back"), None);
    }
}
