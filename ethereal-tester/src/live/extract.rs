use regex::Regex;
use std::sync::OnceLock;

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

/// Pull the JSON object out of a chat reply.
///
/// Prefers the first fenced code block holding an object, then falls back to
/// the span from the first `{` to the last `}`.
#[must_use]
pub fn extract_json(reply: &str) -> Option<&str> {
    if let Some(inner) = fenced_block()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
    {
        return Some(inner.as_str());
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_passes_through() {
        assert_eq!(extract_json(r#"{"narrative":"x"}"#), Some(r#"{"narrative":"x"}"#));
    }

    #[test]
    fn fenced_block_wins_over_prose() {
        let reply = "Here you go {not this}\n```json\n{\"narrative\": \"Rain.\"}\n```\nEnjoy!";
        assert_eq!(extract_json(reply), Some("{\"narrative\": \"Rain.\"}"));
    }

    #[test]
    fn unlabelled_fence_and_nested_objects() {
        let reply = "```\n{\"loot\": {\"name\": \"Orb\"}}\n```";
        assert_eq!(extract_json(reply), Some("{\"loot\": {\"name\": \"Orb\"}}"));
    }

    #[test]
    fn prose_around_object() {
        let reply = "Sure! {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_json(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn nothing_to_extract() {
        assert_eq!(extract_json("The oracle is silent."), None);
        assert_eq!(extract_json("} backwards {"), None);
    }
}
