//! URL extraction from free text.

/// Extract every URL from `text`, in order of appearance.
///
/// A URL starts at an `http://` or `https://` occurrence (anywhere, not just
/// at a token boundary) and runs to the next whitespace character. Duplicates
/// are kept; callers that need distinct URLs deduplicate themselves. The
/// function is pure and idempotent.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut from = 0;

    while let Some(start) = find_scheme(text, from) {
        let rest = &text[start..];
        let end = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        urls.push(rest[..end].to_string());
        from = start + end;
    }

    urls
}

/// Position of the next `http://` or `https://` at or after `from`.
fn find_scheme(text: &str, from: usize) -> Option<usize> {
    let tail = text.get(from..)?;
    let http = tail.find("http://");
    let https = tail.find("https://");

    let offset = match (http, https) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }?;
    Some(from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_urls("").is_empty());
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        let text = "see http://a.test then https://b.test and http://a.test again";
        assert_eq!(
            extract_urls(text),
            vec!["http://a.test", "https://b.test", "http://a.test"]
        );
    }

    #[test]
    fn urls_may_start_mid_token() {
        assert_eq!(
            extract_urls("link:(http://a.test/x)"),
            vec!["http://a.test/x)"]
        );
    }

    #[test]
    fn a_url_runs_to_the_next_whitespace() {
        assert_eq!(
            extract_urls("http://a.test/path?q=1,http://b.test next"),
            vec!["http://a.test/path?q=1,http://b.test"]
        );
    }

    #[test]
    fn both_schemes_are_recognized() {
        assert_eq!(
            extract_urls("https://secure.test http://plain.test"),
            vec!["https://secure.test", "http://plain.test"]
        );
        // A scheme fragment without the full prefix is not a URL.
        assert!(extract_urls("httpx://nope.test htt p://nope").is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "a http://one.test b https://two.test c";
        let first = extract_urls(text);
        let second = extract_urls(&first.join(" "));
        assert_eq!(first, second);
        assert_eq!(extract_urls(text), extract_urls(text));
    }

    #[test]
    fn unicode_text_around_urls_is_handled() {
        assert_eq!(
            extract_urls("שלום http://a.test עולם"),
            vec!["http://a.test"]
        );
    }
}
