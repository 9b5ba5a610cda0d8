//! Button driven pages for embeds.
//!
//! Buttons are told apart by a custom id made of the invocation id and a suffix,
//! so several paginated replies can live in the same channel.

use std::time::Duration;

use async_trait::async_trait;
use poise::CreateReply;
use serenity::ButtonStyle;
use serenity::ComponentInteractionCollector;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;

use crate::serenity;
use crate::Context;
use crate::KselonError;

/// Sessions end after this long without a button press.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// A navigation button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    First,
    Previous,
    Next,
    Last,
}

impl Nav {
    const ALL: [Nav; 4] = [Nav::First, Nav::Previous, Nav::Next, Nav::Last];

    fn suffix(self) -> &'static str {
        match self {
            Nav::First => "first",
            Nav::Previous => "prev",
            Nav::Next => "next",
            Nav::Last => "last",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Nav::First => "≪",
            Nav::Previous => "←",
            Nav::Next => "→",
            Nav::Last => "≫",
        }
    }

    /// The full custom id of this button for a session.
    pub fn custom_id(self, session: &str) -> String {
        format!("{session}_{}", self.suffix())
    }

    /// Which button a custom id belongs to, if it is one of this session.
    pub fn from_custom_id(session: &str, custom_id: &str) -> Option<Nav> {
        let suffix = custom_id.strip_prefix(session)?.strip_prefix('_')?;
        Nav::ALL.into_iter().find(|nav| nav.suffix() == suffix)
    }
}

/// The page a session is on. Pages start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    total: usize,
}

impl Pager {
    /// A pager always has at least one page.
    pub fn new(total: usize) -> Self {
        Self {
            page: 0,
            total: total.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn at_start(&self) -> bool {
        self.page == 0
    }

    pub fn at_end(&self) -> bool {
        self.page + 1 >= self.total
    }

    /// Moves to another page, staying in range. Returns whether the page changed.
    pub fn apply(&mut self, nav: Nav) -> bool {
        let old = self.page;
        self.page = match nav {
            Nav::First => 0,
            Nav::Previous => self.page.saturating_sub(1),
            Nav::Next => (self.page + 1).min(self.total - 1),
            Nav::Last => self.total - 1,
        };
        old != self.page
    }
}

/// Number of pages needed for `items`, `per_page` at a time.
pub fn page_count(items: usize, per_page: usize) -> usize {
    items.div_ceil(per_page.max(1))
}

/// Which buttons a session shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buttons {
    /// ← and →, always enabled.
    Arrows,
    /// ≪ ← → ≫, disabled at the ends.
    Full,
}

/// What happens to the buttons once a session is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expire {
    RemoveButtons,
    DisableButtons,
}

/// A single button of a session.
pub fn nav_button(session: &str, nav: Nav, disabled: bool) -> CreateButton {
    CreateButton::new(nav.custom_id(session))
        .label(nav.label())
        .style(ButtonStyle::Secondary)
        .disabled(disabled)
}

/// The row of buttons for the current page. `frozen` disables everything.
pub fn button_row(session: &str, pager: &Pager, style: Buttons, frozen: bool) -> CreateActionRow {
    let buttons = match style {
        Buttons::Arrows => vec![
            nav_button(session, Nav::Previous, frozen),
            nav_button(session, Nav::Next, frozen),
        ],
        Buttons::Full => Nav::ALL
            .into_iter()
            .map(|nav| {
                let disabled = match nav {
                    Nav::First | Nav::Previous => pager.at_start(),
                    Nav::Next | Nav::Last => pager.at_end(),
                };
                nav_button(session, nav, frozen || disabled)
            })
            .collect(),
    };
    CreateActionRow::Buttons(buttons)
}

/// Something that can draw a page. Pages start at 0.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render(&self, page: usize) -> Result<CreateEmbed, KselonError>;
}

/// Shown to whoever pressed a button when the next page could not be drawn.
pub const UPDATE_FAILED: &str = "an error occurred while updating the scores.";

/// The state of one paginated reply between button presses.
pub struct Session<'a> {
    id: String,
    pager: Pager,
    buttons: Buttons,
    embed: CreateEmbed,
    source: &'a dyn PageSource,
}

impl<'a> Session<'a> {
    /// Draws the first page.
    pub async fn start(
        id: String,
        pages: usize,
        buttons: Buttons,
        source: &'a dyn PageSource,
    ) -> Result<Session<'a>, KselonError> {
        let embed = source.render(0).await?;
        Ok(Self {
            id,
            pager: Pager::new(pages),
            buttons,
            embed,
            source,
        })
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn embed(&self) -> &CreateEmbed {
        &self.embed
    }

    pub fn components(&self) -> Vec<CreateActionRow> {
        vec![button_row(&self.id, &self.pager, self.buttons, false)]
    }

    /// Handles a press and returns the answer to it.
    /// A page that fails to draw leaves the session on the page it was on.
    pub async fn press(&mut self, nav: Nav) -> CreateInteractionResponse {
        let mut next = self.pager;
        next.apply(nav);

        match self.source.render(next.page()).await {
            Ok(embed) => {
                self.pager = next;
                self.embed = embed;
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .embed(self.embed.clone())
                        .components(self.components()),
                )
            }
            Err(e) => {
                tracing::warn!("Could not draw page {} of {}: {e}", next.page(), self.id);
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(UPDATE_FAILED)
                        .ephemeral(true),
                )
            }
        }
    }

    /// The buttons left on the message once the session is idle.
    pub fn expired_components(&self, expire: Expire) -> Vec<CreateActionRow> {
        match expire {
            Expire::RemoveButtons => vec![],
            Expire::DisableButtons => vec![button_row(&self.id, &self.pager, self.buttons, true)],
        }
    }
}

/// Options of a paginated reply.
#[derive(Debug, Clone, bon::Builder)]
#[builder(on(String, into))]
pub struct Paginate {
    pub pages: usize,
    #[builder(default = Buttons::Arrows)]
    pub buttons: Buttons,
    #[builder(default = Expire::RemoveButtons)]
    pub expire: Expire,
    /// Text shown above the embed.
    pub content: Option<String>,
}

impl Paginate {
    /// Replies with the first page and handles button presses until the session is idle.
    pub async fn run(self, ctx: Context<'_>, source: &dyn PageSource) -> Result<(), KselonError> {
        let id = ctx.id().to_string();
        let mut session = Session::start(id.clone(), self.pages, self.buttons, source).await?;

        let mut reply = CreateReply::default().embed(session.embed().clone());
        if let Some(content) = &self.content {
            reply = reply.content(content);
        }
        if session.pager().total() == 1 {
            ctx.send(reply).await?;
            return Ok(());
        }

        let handle = ctx.send(reply.components(session.components())).await?;

        let filter_id = id.clone();
        while let Some(press) = ComponentInteractionCollector::new(ctx)
            .filter({
                let filter_id = filter_id.clone();
                move |press| press.data.custom_id.starts_with(&filter_id)
            })
            .timeout(IDLE_TIMEOUT)
            .await
        {
            let Some(nav) = Nav::from_custom_id(&id, &press.data.custom_id) else {
                continue;
            };
            let response = session.press(nav).await;
            if let Err(e) = press.create_response(ctx.serenity_context(), response).await {
                tracing::warn!("Could not answer a page button: {e}");
            }
        }

        // Editing replaces the embeds, so the current one is sent again.
        let mut last = CreateReply::default()
            .embed(session.embed().clone())
            .components(session.expired_components(self.expire));
        if let Some(content) = self.content {
            last = last.content(content);
        }
        if let Err(e) = handle.edit(ctx, last).await {
            tracing::debug!("Could not expire the buttons: {e}");
        }
        Ok(())
    }
}
