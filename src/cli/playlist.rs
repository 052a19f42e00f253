//! Playlist argument parsing

use crate::cli::error::{CliError, CliResult};
use regex::Regex;

/// Extract a playlist id from a raw id or a playlist URL.
///
/// ```
/// use tubesort::cli::parse_playlist_id;
///
/// assert_eq!(
///     parse_playlist_id("https://www.youtube.com/playlist?list=PLabc123").unwrap(),
///     "PLabc123"
/// );
/// assert_eq!(parse_playlist_id("PLabc123").unwrap(), "PLabc123");
/// ```
pub fn parse_playlist_id(input: &str) -> CliResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::InvalidInput("playlist id cannot be empty".to_string()));
    }

    let list_param = Regex::new(r"[?&]list=([^&#]+)").map_err(regex_error)?;
    if let Some(captures) = list_param.captures(input) {
        if let Some(id) = captures.get(1) {
            return Ok(id.as_str().to_string());
        }
    }

    let raw_id = Regex::new(r"^[A-Za-z0-9_-]+$").map_err(regex_error)?;
    if raw_id.is_match(input) {
        return Ok(input.to_string());
    }

    Err(CliError::InvalidInput(format!(
        "not a playlist id or playlist URL: {}",
        input
    )))
}

fn regex_error(err: regex::Error) -> CliError {
    CliError::ExecutionError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_urls() {
        assert_eq!(
            parse_playlist_id("https://www.youtube.com/playlist?list=PL123_abc").unwrap(),
            "PL123_abc"
        );
        assert_eq!(
            parse_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLxyz&index=2").unwrap(),
            "PLxyz"
        );
    }

    #[test]
    fn test_raw_ids() {
        assert_eq!(parse_playlist_id("  PL-raw_1 ").unwrap(), "PL-raw_1");
        assert!(parse_playlist_id("").is_err());
        assert!(parse_playlist_id("https://example.com/no-list").is_err());
        assert!(parse_playlist_id("has spaces").is_err());
    }
}
