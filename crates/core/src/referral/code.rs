//! Referral code generation and format validation.

use rand::Rng;

/// Characters used for the random suffix. No lookalikes (0/O, 1/I) so
/// codes survive being read aloud.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const SUFFIX_LEN: usize = 4;
const PREFIX_MAX_LEN: usize = 6;
const CODE_MIN_LEN: usize = 4;
const CODE_MAX_LEN: usize = 16;

/// Fallback prefix for display names with no usable characters.
const DEFAULT_PREFIX: &str = "MEMBER";

/// Generates a human-readable referral code from a display name.
///
/// Codes look like `ALICE7XKQ`: up to six leading alphanumerics of the
/// display name, uppercased, plus a four-character random suffix. The
/// suffix exists only to dodge collisions; the persistence layer retries
/// on a unique-index violation.
#[must_use]
pub fn generate_code(display_name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            char::from(SUFFIX_ALPHABET[idx])
        })
        .collect();
    generate_code_with_suffix(display_name, &suffix)
}

/// Deterministic variant of [`generate_code`] for tests and retries.
#[must_use]
pub fn generate_code_with_suffix(display_name: &str, suffix: &str) -> String {
    let prefix: String = display_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(PREFIX_MAX_LEN)
        .collect::<String>()
        .to_ascii_uppercase();

    let prefix = if prefix.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        prefix
    };

    format!("{prefix}{suffix}")
}

/// Validates the format of a referral code supplied by a new user.
///
/// Format errors are input errors, reported immediately without touching
/// storage.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_display_name() {
        assert_eq!(generate_code_with_suffix("Alice", "7XKQ"), "ALICE7XKQ");
        assert_eq!(generate_code_with_suffix("Bob Smith", "ZZZZ"), "BOBSMIZZZZ");
    }

    #[test]
    fn test_non_alphanumerics_stripped() {
        assert_eq!(generate_code_with_suffix("j.o-e!", "AB12"), "JOEAB12");
    }

    #[test]
    fn test_empty_name_falls_back() {
        assert_eq!(generate_code_with_suffix("", "AB12"), "MEMBERAB12");
        assert_eq!(generate_code_with_suffix("!!!", "AB12"), "MEMBERAB12");
    }

    #[test]
    fn test_generated_codes_are_valid() {
        for name in ["Alice", "Bob Smith", "", "名前"] {
            let code = generate_code(name);
            assert!(is_valid_code(&code), "invalid code generated: {code}");
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..32).map(|_| generate_code("Alice")).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_code_format_validation() {
        assert!(is_valid_code("ALICE7XKQ"));
        assert!(is_valid_code("AB12"));
        assert!(!is_valid_code("abc"));
        assert!(!is_valid_code("TOOLONGTOOLONGTOO"));
        assert!(!is_valid_code("WITH SPACE"));
        assert!(!is_valid_code(""));
    }
}
