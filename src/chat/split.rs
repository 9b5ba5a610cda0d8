//! Splitting long answers into messages Discord accepts.

/// Characters per message, below Discord's limit of 2000.
pub const CHAR_LIMIT: usize = 1900;

const FENCE: &str = "```";

/// Splits `text` into messages of at most `limit` characters (plus fences).
/// Text between ``` fences is chunked separately and each chunk is fenced again,
/// so code blocks survive the split.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut messages = Vec::new();
    for (i, part) in text.split(FENCE).enumerate() {
        let is_code = i % 2 == 1;
        let chars: Vec<char> = part.chars().collect();

        for chunk in chars.chunks(limit.max(1)) {
            let chunk: String = chunk.iter().collect();
            if is_code {
                messages.push(format!("{FENCE}{chunk}{FENCE}"));
            } else {
                messages.push(chunk);
            }
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(split_message("hello ```x```", 1900), ["hello ```x```"]);
    }

    #[test]
    fn long_text_is_chunked() {
        let text = "a".repeat(25);

        assert_eq!(
            split_message(&text, 10),
            ["a".repeat(10), "a".repeat(10), "a".repeat(5)]
        );
    }

    #[test]
    fn code_blocks_are_fenced_again() {
        let text = "intro```rust\nfn main() {}\n```outro";

        assert_eq!(
            split_message(text, 12),
            ["intro", "```rust\nfn main```", "```() {}\n```", "outro"]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(4);

        assert_eq!(split_message(&text, 4), [text.clone()]);
        assert_eq!(split_message(&text, 3), ["ééé", "é"]);
    }
}
