//! Debug logging of scrub events without leaking what was scrubbed.
//!
//! Original text only shows up in logs when `PAGESCRUB_ALLOW_DEBUG_PII=true`.
//! Otherwise it is masked down to its length.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Read once; whether original text may appear in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PAGESCRUB_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Masks sensitive text for display.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn loggable(original: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        original.to_string()
    } else {
        redact_sensitive(original)
    }
}

/// Logs a rewritten string at debug level. `what` names the location, e.g. "text".
pub fn log_scrub_debug(what: &str, original: &str, scrubbed: &str) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    debug!(
        "Scrubbed {}: Original='{}', Scrubbed='{}'",
        what,
        loggable(original),
        scrubbed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_fully_masked() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]");
    }

    #[test]
    fn long_strings_report_length() {
        assert_eq!(redact_sensitive("jagilber-1"), "[REDACTED: 10 chars]");
    }
}
