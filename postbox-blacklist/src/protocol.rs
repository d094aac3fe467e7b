//! Request encoding and response parsing for the blacklist wire protocol.
//!
//! Requests are one line each, terminated by `\n`:
//!
//! ```text
//! 1 <url>        add
//! 2 <url>        check
//! DELETE <url>   remove
//! ```
//!
//! Responses:
//!
//! ```text
//! 200 OK\n<bool> <bool>\n   to a check; blacklisted iff both tokens are
//!                           the literal string "true"
//! 201 Created\n             to an add
//! 204 No Content\n          to a remove that removed something
//! 404 Not Found\n           to a remove that found nothing
//! ```
//!
//! Anything outside this grammar is a protocol error, never a verdict.

use crate::error::{BlacklistError, Result};

/// A request to the blacklist service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask whether a URL is on the blacklist.
    Check(String),
    /// Put a URL on the blacklist.
    Add(String),
    /// Take a URL off the blacklist.
    Remove(String),
}

impl Command {
    /// Encode the request line, including the terminating newline.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Check(url) => format!("2 {url}\n"),
            Self::Add(url) => format!("1 {url}\n"),
            Self::Remove(url) => format!("DELETE {url}\n"),
        }
    }

    /// Parse a request line as the service sees it.
    ///
    /// Returns `None` for lines outside the request grammar.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (verb, url) = line.trim_end_matches(['\r', '\n']).split_once(' ')?;
        let url = url.trim();
        if url.is_empty() || url.contains(char::is_whitespace) {
            return None;
        }

        match verb {
            "2" => Some(Self::Check(url.to_string())),
            "1" => Some(Self::Add(url.to_string())),
            "DELETE" => Some(Self::Remove(url.to_string())),
            _ => None,
        }
    }
}

/// Outcome of a remove request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Parse the buffered response to a check request.
///
/// # Errors
/// Returns [`BlacklistError::Protocol`] if the first line is not `200 OK`
/// or the verdict line is missing.
pub fn parse_check_response(text: &str) -> Result<bool> {
    let mut lines = text.lines();

    match lines.next() {
        Some("200 OK") => {}
        other => {
            return Err(BlacklistError::Protocol(format!(
                "Expected '200 OK', got {other:?}"
            )));
        }
    }

    let verdict = lines.next().ok_or_else(|| {
        BlacklistError::Protocol("Check response is missing its verdict line".to_string())
    })?;

    // Only the exact pair "true true" reports a blacklisted URL; any other
    // token combination is a definitive negative.
    let mut tokens = verdict.split_whitespace();
    Ok(tokens.next() == Some("true")
        && tokens.next() == Some("true")
        && tokens.next().is_none())
}

/// Parse the buffered response to an add request.
///
/// # Errors
/// Returns [`BlacklistError::Protocol`] for anything other than
/// `201 Created`.
pub fn parse_add_response(text: &str) -> Result<()> {
    match text.lines().next() {
        Some("201 Created") => Ok(()),
        other => Err(BlacklistError::Protocol(format!(
            "Expected '201 Created', got {other:?}"
        ))),
    }
}

/// Parse the buffered response to a remove request.
///
/// # Errors
/// Returns [`BlacklistError::Protocol`] for anything other than
/// `204 No Content` or `404 Not Found`.
pub fn parse_remove_response(text: &str) -> Result<RemoveOutcome> {
    match text.lines().next() {
        Some("204 No Content") => Ok(RemoveOutcome::Removed),
        Some("404 Not Found") => Ok(RemoveOutcome::NotFound),
        other => Err(BlacklistError::Protocol(format!(
            "Expected '204 No Content' or '404 Not Found', got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_lines_are_byte_exact() {
        assert_eq!(
            Command::Check("http://evil.test".to_string()).encode(),
            "2 http://evil.test\n"
        );
        assert_eq!(
            Command::Add("http://evil.test".to_string()).encode(),
            "1 http://evil.test\n"
        );
        assert_eq!(
            Command::Remove("http://evil.test".to_string()).encode(),
            "DELETE http://evil.test\n"
        );
    }

    #[test]
    fn parse_accepts_exactly_the_request_grammar() {
        assert_eq!(
            Command::parse("2 http://a.test\n"),
            Some(Command::Check("http://a.test".to_string()))
        );
        assert_eq!(
            Command::parse("1 http://a.test"),
            Some(Command::Add("http://a.test".to_string()))
        );
        assert_eq!(
            Command::parse("DELETE http://a.test\r\n"),
            Some(Command::Remove("http://a.test".to_string()))
        );

        assert_eq!(Command::parse("GET http://a.test"), None);
        assert_eq!(Command::parse("3 http://a.test"), None);
        assert_eq!(Command::parse("2"), None);
        assert_eq!(Command::parse("2 "), None);
        assert_eq!(Command::parse("2 two urls"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn check_verdict_requires_both_tokens_true() {
        assert!(parse_check_response("200 OK\ntrue true\n").unwrap());
        assert!(!parse_check_response("200 OK\ntrue false\n").unwrap());
        assert!(!parse_check_response("200 OK\nfalse false\n").unwrap());
        assert!(!parse_check_response("200 OK\nfalse\n").unwrap());
        assert!(!parse_check_response("200 OK\ntrue true true\n").unwrap());
        assert!(!parse_check_response("200 OK\nTRUE TRUE\n").unwrap());
    }

    #[test]
    fn check_rejects_nonconforming_responses() {
        assert!(parse_check_response("500 Oops\ntrue true\n").is_err());
        assert!(parse_check_response("200 OK").is_err());
        assert!(parse_check_response("").is_err());
    }

    #[test]
    fn add_and_remove_parse_their_status_lines() {
        parse_add_response("201 Created\n").unwrap();
        assert!(parse_add_response("200 OK\n").is_err());

        assert_eq!(
            parse_remove_response("204 No Content\n").unwrap(),
            RemoveOutcome::Removed
        );
        assert_eq!(
            parse_remove_response("404 Not Found\n").unwrap(),
            RemoveOutcome::NotFound
        );
        assert!(parse_remove_response("410 Gone\n").is_err());
    }
}
