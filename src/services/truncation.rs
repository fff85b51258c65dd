//! Prompt shrinking used when the completion API rejects a request for
//! exceeding the model's context window.

use serde_json::Value;

use super::completion_client::{ChatMessage, Role};

/// Truncated messages never go below this many characters
pub const MIN_MESSAGE_CHARS: usize = 500;

const SHRINK_FACTOR: f64 = 0.8;

pub fn shrink_token_budget(max_tokens: u32) -> u32 {
    ((max_tokens as f64 * SHRINK_FACTOR).floor() as u32).max(1)
}

/// Cut the longest user message down to 80% of its length.
///
/// Returns `false` when no user message could be shortened any further.
pub fn shrink_largest_user_message(messages: &mut [ChatMessage]) -> bool {
    let Some(largest) = messages
        .iter_mut()
        .filter(|message| message.role == Role::User)
        .max_by_key(|message| message.content.chars().count())
    else {
        return false;
    };

    let current = largest.content.chars().count();
    let budget = ((current as f64 * SHRINK_FACTOR) as usize).max(MIN_MESSAGE_CHARS);
    if budget >= current {
        return false;
    }

    largest.content = truncate_content(&largest.content, budget);
    true
}

/// Fit `content` into `budget` characters.
///
/// When the content embeds a JSON array, whole leading elements are kept so
/// the model still receives valid JSON; otherwise the text is cut at a
/// character boundary.
pub fn truncate_content(content: &str, budget: usize) -> String {
    if content.chars().count() <= budget {
        return content.to_string();
    }

    truncate_json_array(content, budget).unwrap_or_else(|| content.chars().take(budget).collect())
}

fn truncate_json_array(content: &str, budget: usize) -> Option<String> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    if end <= start {
        return None;
    }

    let items: Vec<Value> = serde_json::from_str(&content[start..=end]).ok()?;
    let prefix = &content[..start];
    let suffix = &content[end + 1..];

    (1..items.len()).rev().find_map(|keep| {
        let rendered = serde_json::to_string_pretty(&items[..keep]).ok()?;
        let candidate = format!("{prefix}{rendered}{suffix}");
        (candidate.chars().count() <= budget).then_some(candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_payload(count: usize) -> String {
        let results: Vec<Value> = (0..count)
            .map(|idx| {
                json!({
                    "title": format!("Result {idx}"),
                    "snippet": "x".repeat(200),
                    "link": format!("https://example.com/{idx}")
                })
            })
            .collect();
        format!(
            "Search results:\n{}",
            serde_json::to_string_pretty(&results).unwrap()
        )
    }

    #[test]
    fn test_short_content_is_untouched() {
        assert_eq!(truncate_content("hello", 10), "hello");
    }

    #[test]
    fn test_json_array_keeps_leading_elements() {
        let content = search_payload(10);
        let budget = content.chars().count() / 2;
        let truncated = truncate_content(&content, budget);

        assert!(truncated.chars().count() <= budget);
        let start = truncated.find('[').unwrap();
        let items: Vec<Value> = serde_json::from_str(&truncated[start..]).unwrap();
        assert!(!items.is_empty());
        assert!(items.len() < 10);
        assert_eq!(items[0]["title"], "Result 0");
    }

    #[test]
    fn test_plain_text_falls_back_to_char_slicing() {
        let content = "é".repeat(100);
        let truncated = truncate_content(&content, 40);
        assert_eq!(truncated.chars().count(), 40);
    }

    #[test]
    fn test_shrink_targets_largest_user_message() {
        let mut messages = vec![
            ChatMessage::system("s".repeat(5000)),
            ChatMessage::user("short"),
            ChatMessage::user("u".repeat(2000)),
        ];

        assert!(shrink_largest_user_message(&mut messages));
        assert_eq!(messages[0].content.len(), 5000);
        assert_eq!(messages[1].content, "short");
        assert_eq!(messages[2].content.chars().count(), 1600);
    }

    #[test]
    fn test_shrink_stops_at_floor() {
        let mut messages = vec![ChatMessage::user("u".repeat(MIN_MESSAGE_CHARS))];
        assert!(!shrink_largest_user_message(&mut messages));
    }

    #[test]
    fn test_token_budget_shrinks() {
        assert_eq!(shrink_token_budget(4500), 3600);
        assert_eq!(shrink_token_budget(1), 1);
    }
}
