// Log Sanitization
//
// ERP instance URLs, database names, usernames, and backend error messages
// all originate from request payloads or remote servers. Anything of that
// origin passes through here before it is logged, so injected newlines or
// terminal escapes cannot forge log entries. Credentials are never logged
// at all.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hard cap on logged user input to keep single log lines bounded.
const MAX_LOG_LENGTH: usize = 200;

static ANSI_ESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap());

/// Strip ANSI escapes, newlines, and control characters; truncate to a
/// bounded length.
pub fn sanitize_for_log(input: &str) -> String {
    let no_ansi = ANSI_ESCAPE_REGEX.replace_all(input, "");

    let cleaned: String = no_ansi
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 && code != 0x7F || code > 0x7F
        })
        .collect();

    if cleaned.chars().count() > MAX_LOG_LENGTH {
        let truncated: String = cleaned.chars().take(MAX_LOG_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_newlines() {
        let input = "svc@mill.example\nINFO forged entry";
        let result = sanitize_for_log(input);
        assert!(!result.contains('\n'));
        assert_eq!(result, "svc@mill.example INFO forged entry");
    }

    #[test]
    fn removes_ansi_escapes_and_control_chars() {
        let result = sanitize_for_log("url\x1b[2K\r\x00tail");
        assert!(!result.contains('\x1b'));
        assert!(!result.contains('\x00'));
        assert!(result.contains("url"));
        assert!(result.contains("tail"));
    }

    #[test]
    fn truncates_oversized_input() {
        let long = "a".repeat(500);
        let result = sanitize_for_log(&long);
        assert!(result.len() <= MAX_LOG_LENGTH + 3);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn passes_ordinary_urls_through() {
        let url = "https://mill.odoo.example/jsonrpc";
        assert_eq!(sanitize_for_log(url), url);
    }

    #[test]
    fn multibyte_input_within_the_char_limit_is_untouched() {
        // 150 chars but 300 bytes; the cap counts characters, so nothing
        // may be dropped and no ellipsis appended.
        let input = "é".repeat(150);
        assert_eq!(sanitize_for_log(&input), input);
    }
}
