//! Chatting with the bot through an LLM.
//!
//! Every `chat` request goes into one queue. A single worker answers them in
//! the order they arrived, so the shared conversation stays consistent.

mod history;
mod prompts;
mod provider;
mod split;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Local;
use serenity::ChannelId;
use serenity::CommandInteraction;
use serenity::CreateInteractionResponseFollowup;
use serenity::Http;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::serenity;
use crate::KselonError;
use history::History;
pub use prompts::Persona;
pub use provider::ChatProvider;
pub use provider::OpenAi;
use provider::strip_boilerplate;
pub use split::split_message;
pub use split::CHAR_LIMIT;

/// Where the answer to a request goes.
#[derive(Debug, Clone)]
pub enum Origin {
    /// Text command, answered in the channel.
    Prefix,
    /// Deferred slash command, answered with a followup.
    Slash {
        interaction: Box<CommandInteraction>,
        ephemeral: bool,
    },
}

/// A `.txt` file sent along with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAttachment {
    pub filename: String,
    pub content: String,
}

/// One message waiting for an answer.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub author: String,
    pub channel: ChannelId,
    pub text: String,
    pub attachment: Option<TextAttachment>,
    pub origin: Origin,
}

impl ChatRequest {
    /// What the model sees, prefixed with the date.
    pub fn model_message(&self, now: DateTime<Local>) -> String {
        let date = now.format("%A|%B|%Y");
        let mut message = format!("{}: [{date}] {}", self.author, self.text);
        if let Some(file) = &self.attachment {
            message.push('\n');
            message.push_str(&file.content);
        }
        message
    }

    /// Quote of the request shown above the answer.
    pub fn display_line(&self) -> String {
        match &self.attachment {
            Some(file) => format!(
                "> {}: {} (file attached: {})",
                self.author, self.text, file.filename
            ),
            None => format!("> {}: {}", self.author, self.text),
        }
    }
}

/// The start prompt, sent when the bot is ready and after a reset.
#[derive(Debug, Clone, Default)]
pub struct StartPrompt {
    pub enabled: bool,
    pub text: String,
    /// Channel receiving the answers.
    pub channel: Option<ChannelId>,
}

#[derive(Debug)]
struct Session {
    history: History,
    provider: Arc<dyn ChatProvider>,
}

impl Session {
    async fn ask(&mut self, message: &str) -> Result<String, KselonError> {
        self.history.push_user(message);
        let answer = self.provider.complete(self.history.as_slice()).await?;
        let answer = strip_boilerplate(&answer);
        self.history.push_assistant(answer.clone());
        Ok(answer)
    }
}

/// Handle to the shared conversation and its queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Chat {
    session: Arc<Mutex<Session>>,
    queue: mpsc::UnboundedSender<ChatRequest>,
    start_prompt: Arc<StartPrompt>,
}

/// Receiving end of the queue, given to [run_worker].
pub type ChatQueue = mpsc::UnboundedReceiver<ChatRequest>;

impl Chat {
    pub fn new(provider: Arc<dyn ChatProvider>, start_prompt: StartPrompt) -> (Self, ChatQueue) {
        let (queue, receiver) = mpsc::unbounded_channel();
        let session = Session {
            history: History::default(),
            provider,
        };
        let chat = Self {
            session: Arc::new(Mutex::new(session)),
            queue,
            start_prompt: Arc::new(start_prompt),
        };
        (chat, receiver)
    }

    /// Puts a request at the back of the queue.
    pub fn enqueue(&self, request: ChatRequest) -> Result<(), KselonError> {
        self.queue
            .send(request)
            .map_err(|_| KselonError::ChatProvider {
                reason: "the chat worker stopped".to_string(),
            })
    }

    /// Sends a message and returns the answer.
    pub async fn ask(&self, message: &str) -> Result<String, KselonError> {
        self.session.lock().await.ask(message).await
    }

    /// Forgets the conversation.
    pub async fn reset(&self) {
        self.session.lock().await.history.clear();
    }

    /// Starts a new conversation with `persona`, returning its first answer.
    pub async fn switch(&self, persona: Persona) -> Result<String, KselonError> {
        let mut session = self.session.lock().await;
        session.history.clear();
        session.ask(&persona.prompt()).await
    }

    /// Sends the start prompt if it's enabled and not empty.
    pub async fn send_start_prompt(&self) -> Result<Option<String>, KselonError> {
        let start = &self.start_prompt;
        if !start.enabled {
            tracing::info!("Start prompt is disabled, skipping it.");
            return Ok(None);
        }
        if start.text.trim().is_empty() {
            tracing::info!("No start prompt, skipping it.");
            return Ok(None);
        }

        tracing::info!("Sending start prompt with size {}.", start.text.len());
        let answer = self.ask(&start.text).await?;
        tracing::debug!("Start prompt answer: {answer}");
        Ok(Some(answer))
    }

    /// Posts text in the start prompt channel, if there is one.
    pub async fn post_to_prompt_channel(&self, http: &Http, text: &str) -> Result<(), KselonError> {
        let Some(channel) = self.start_prompt.channel else {
            return Ok(());
        };
        for chunk in split_message(text, CHAR_LIMIT) {
            if !chunk.trim().is_empty() {
                channel.say(http, chunk).await?;
            }
        }
        Ok(())
    }
}

/// Delivers answers. Split out of the worker so it can run without Discord.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Shows that an answer is being written, until the returned guard is dropped.
    fn start_typing(&self, channel: ChannelId) -> Option<serenity::Typing>;

    /// Sends the answer, already split into messages.
    async fn deliver(&self, request: &ChatRequest, messages: Vec<String>) -> Result<(), KselonError>;
}

/// Sends answers through Discord.
#[derive(Debug, Clone)]
pub struct DiscordOutbox {
    pub http: Arc<Http>,
}

#[async_trait]
impl Outbox for DiscordOutbox {
    fn start_typing(&self, channel: ChannelId) -> Option<serenity::Typing> {
        Some(channel.start_typing(&self.http))
    }

    async fn deliver(&self, request: &ChatRequest, messages: Vec<String>) -> Result<(), KselonError> {
        let mut messages = messages.into_iter().filter(|m| !m.trim().is_empty());

        // The first message answers the command, the rest go to the channel.
        if let Some(first) = messages.next() {
            match &request.origin {
                Origin::Prefix => {
                    request.channel.say(&self.http, first).await?;
                }
                Origin::Slash {
                    interaction,
                    ephemeral,
                } => {
                    let followup = CreateInteractionResponseFollowup::new()
                        .content(first)
                        .ephemeral(*ephemeral);
                    interaction.create_followup(&self.http, followup).await?;
                }
            }
        }
        for message in messages {
            request.channel.say(&self.http, message).await?;
        }
        Ok(())
    }
}

/// Answers queued requests one by one until every [Chat] handle is dropped.
/// Failures are logged and the next request is processed.
pub async fn run_worker(chat: Chat, mut queue: ChatQueue, outbox: impl Outbox) {
    while let Some(request) = queue.recv().await {
        let _typing = outbox.start_typing(request.channel);

        let answer = match chat.ask(&request.model_message(Local::now())).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Error while processing chat message: {e}");
                continue;
            }
        };

        let content = format!("{} \n{answer}", request.display_line());
        if let Err(e) = outbox
            .deliver(&request, split_message(&content, CHAR_LIMIT))
            .await
        {
            tracing::warn!("Error while sending chat answer: {e}");
        }
    }
    tracing::info!("Chat queue closed.");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::history::Turn;
    use super::*;

    /// Answers with the number of turns it was given, or fails on "boom".
    #[derive(Debug, Default)]
    struct CountingProvider;

    #[async_trait]
    impl ChatProvider for CountingProvider {
        async fn complete(&self, history: &[Turn]) -> Result<String, KselonError> {
            let last = history.last().map(|t| t.content.as_str()).unwrap_or("");
            if last.ends_with("boom") {
                return Err(KselonError::ChatProvider {
                    reason: "boom".to_string(),
                });
            }
            Ok(format!(
                "{} turns\ngenerated by blackbox.ai, try unlimited chat https://www.blackbox.ai",
                history.len()
            ))
        }
    }

    #[derive(Default)]
    struct RecordingOutbox {
        sent: StdMutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl Outbox for &RecordingOutbox {
        fn start_typing(&self, _channel: ChannelId) -> Option<serenity::Typing> {
            None
        }

        async fn deliver(
            &self,
            request: &ChatRequest,
            messages: Vec<String>,
        ) -> Result<(), KselonError> {
            self.sent
                .lock()
                .unwrap()
                .push((request.text.clone(), messages));
            Ok(())
        }
    }

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            author: "ano".to_string(),
            channel: ChannelId::new(1),
            text: text.to_string(),
            attachment: None,
            origin: Origin::Prefix,
        }
    }

    fn chat(start_prompt: StartPrompt) -> (Chat, ChatQueue) {
        Chat::new(Arc::new(CountingProvider), start_prompt)
    }

    #[test]
    fn messages_carry_the_date_and_attachment() {
        let mut request = request("look at this");
        request.attachment = Some(TextAttachment {
            filename: "notes.txt".to_string(),
            content: "line".to_string(),
        });
        let now = Local.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();

        assert_eq!(
            request.model_message(now),
            "ano: [Friday|March|2025] look at this\nline"
        );
        assert_eq!(
            request.display_line(),
            "> ano: look at this (file attached: notes.txt)"
        );
    }

    #[tokio::test]
    async fn worker_answers_in_order_and_survives_failures() {
        let (chat, queue) = chat(StartPrompt::default());
        let outbox = RecordingOutbox::default();

        for text in ["first", "boom", "second"] {
            chat.enqueue(request(text)).unwrap();
        }
        // Dropping the last sender lets the worker finish.
        let worker_chat = chat.clone();
        drop(chat);
        run_worker(worker_chat, queue, &outbox).await;

        let sent = outbox.sent.into_inner().unwrap();
        assert_eq!(
            sent,
            [
                ("first".to_string(), vec!["> ano: first \n1 turns".to_string()]),
                // The failed request still counts as a user turn.
                ("second".to_string(), vec!["> ano: second \n4 turns".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn switching_persona_starts_over() {
        let (chat, _queue) = chat(StartPrompt::default());
        chat.ask("hello").await.unwrap();
        chat.ask("again").await.unwrap();

        let answer = chat.switch(Persona::Kselon).await.unwrap();
        assert_eq!(answer, "1 turns");
    }

    #[tokio::test]
    async fn start_prompt_only_when_enabled() {
        let (disabled, _queue) = chat(StartPrompt {
            enabled: false,
            text: "be nice".to_string(),
            channel: None,
        });
        assert_eq!(disabled.send_start_prompt().await.unwrap(), None);

        let (empty, _queue) = chat(StartPrompt {
            enabled: true,
            text: "  ".to_string(),
            channel: None,
        });
        assert_eq!(empty.send_start_prompt().await.unwrap(), None);

        let (enabled, _queue) = chat(StartPrompt {
            enabled: true,
            text: "be nice".to_string(),
            channel: None,
        });
        enabled.ask("old message").await.unwrap();
        enabled.reset().await;
        assert_eq!(
            enabled.send_start_prompt().await.unwrap().as_deref(),
            Some("1 turns")
        );
    }
}
