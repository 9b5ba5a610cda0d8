//! Chat completion backends.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;

use super::history::Turn;
use crate::setup::LlmConfig;
use crate::KselonError;

/// Answers can take a while.
const TIMEOUT: Duration = Duration::from_secs(120);

/// Advertisement some providers append to every answer.
const BOILERPLATE: &str = "generated by blackbox.ai";
const BOILERPLATE_TAIL: &str = " try unlimited chat https://www.blackbox.ai";

/// Something that continues a conversation.
#[async_trait]
pub trait ChatProvider: Debug + Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<String, KselonError>;
}

/// Any API speaking OpenAI's chat completions format.
#[derive(Debug)]
pub struct OpenAi {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAi {
    pub fn new(http: Client, config: &LlmConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatProvider for OpenAi {
    async fn complete(&self, history: &[Turn]) -> Result<String, KselonError> {
        let request = Request {
            model: &self.model,
            messages: history,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(TIMEOUT)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| KselonError::ChatProvider {
                reason: e.to_string(),
            })?
            .json::<Response>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| KselonError::ChatProvider {
                reason: "no choices in the response".to_string(),
            })
    }
}

/// Removes the provider advertisement (any case) and surrounding whitespace.
pub fn strip_boilerplate(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets the same.
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = lower[search..].find(BOILERPLATE) {
        let start = search + found;
        let mut end = start + BOILERPLATE.len();

        if lower[end..].starts_with(',') {
            end += 1;
        }
        if !lower[end..].starts_with(BOILERPLATE_TAIL) {
            // Not the full advertisement, keep it.
            search = start + BOILERPLATE.len();
            continue;
        }
        end += BOILERPLATE_TAIL.len();
        if lower[end..].starts_with('/') {
            end += 1;
        }

        out.push_str(&text[copied..start]);
        copied = end;
        search = end;
    }
    out.push_str(&text[copied..]);

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chat::history::History;

    #[test]
    fn strips_the_advertisement() {
        let text = "Hello there!\n\nGenerated by BLACKBOX.AI, try unlimited chat https://www.blackbox.ai/";

        assert_eq!(strip_boilerplate(text), "Hello there!");
    }

    #[test]
    fn comma_and_slash_are_optional() {
        let text = "a generated by blackbox.ai try unlimited chat https://www.blackbox.ai b";

        assert_eq!(strip_boilerplate(text), "a  b");
    }

    #[test]
    fn partial_mentions_are_kept() {
        let text = "  this was generated by blackbox.ai apparently ";

        assert_eq!(
            strip_boilerplate(text),
            "this was generated by blackbox.ai apparently"
        );
    }

    #[test]
    fn request_uses_chat_completions_format() {
        let mut history = History::default();
        history.push_user("hi");
        let request = Request {
            model: "gpt",
            messages: history.as_slice(),
        };

        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"model":"gpt","messages":[{"role":"user","content":"hi"}]}"#
        );
    }

    #[test]
    fn reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"meow"}}]}"#;
        let response: Response = serde_json::from_str(body).unwrap();

        assert_eq!(response.choices[0].message.content, "meow");
    }
}
