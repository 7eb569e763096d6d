//! Shared-secret validation for host-check ingestion.

use sentinel_config::PLACEHOLDER_SHARED_SECRET;

const MIN_SECRET_LEN: usize = 16;
const FORBIDDEN_CHARS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '{', '}', '[', ']', '\\'];

pub fn validate_secret(provided: &str, configured: &str) -> bool {
    if provided.len() < MIN_SECRET_LEN {
        return false;
    }
    if provided.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
        return false;
    }
    if provided == PLACEHOLDER_SHARED_SECRET {
        return false;
    }
    constant_time_eq(provided.as_bytes(), configured.as_bytes())
}

/// Avoids leaking timing information about how many leading bytes match.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_secret() {
        assert!(!validate_secret("short", "short"));
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(!validate_secret("abcdefgh$(whoami)", "abcdefgh$(whoami)"));
    }

    #[test]
    fn rejects_placeholder_value() {
        assert!(!validate_secret(PLACEHOLDER_SHARED_SECRET, PLACEHOLDER_SHARED_SECRET));
    }

    #[test]
    fn accepts_sufficiently_long_real_secret() {
        assert!(validate_secret("a-real-secret-value-1234", "a-real-secret-value-1234"));
    }

    #[test]
    fn rejects_mismatched_secret() {
        assert!(!validate_secret("a-real-secret-value-1234", "a-different-secret-value"));
    }
}
