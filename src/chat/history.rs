//! The conversation sent to the chat model.

use delegate::delegate;
use serde::Serialize;

/// Once longer than this, old turns are dropped.
const MAX_TURNS: usize = 26;

/// Turns dropped when the history is too long. The first turns hold the
/// start prompt and its answer, so they're kept.
const DROPPED_TURNS: std::ops::Range<usize> = 4..6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Default, Clone)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Adds a user turn, dropping older turns if needed.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            content: content.into(),
        });
        if self.turns.len() > MAX_TURNS {
            self.turns.drain(DROPPED_TURNS);
        }
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    delegate! {
        to self.turns {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            pub fn clear(&mut self);
            pub fn as_slice(&self) -> &[Turn];
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn contents(history: &History) -> Vec<&str> {
        history.as_slice().iter().map(|t| t.content.as_str()).collect()
    }

    #[test]
    fn trims_after_the_start_prompt() {
        let mut history = History::default();
        for i in 0..13 {
            history.push_user(format!("u{i}"));
            history.push_assistant(format!("a{i}"));
        }
        assert_eq!(history.len(), 26);

        history.push_user("u13");

        // 27 turns, two dropped
        assert_eq!(history.len(), 25);
        assert_eq!(contents(&history)[..6], ["u0", "a0", "u1", "a1", "u3", "a3"]);
        assert_eq!(contents(&history).last(), Some(&"u13"));
    }

    #[test]
    fn roles_serialize_in_lowercase() {
        let mut history = History::default();
        history.push_assistant("hi");

        let json = serde_json::to_string(history.as_slice()).unwrap();
        assert_eq!(json, r#"[{"role":"assistant","content":"hi"}]"#);
    }
}
