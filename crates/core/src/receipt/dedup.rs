//! Content fingerprinting for duplicate-upload detection.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 content fingerprint of raw image bytes.
///
/// The fingerprint is deterministic, so re-uploading a byte-identical
/// image produces the same value and trips the `(user_id, image_sha256)`
/// unique index instead of earning points twice.
#[must_use]
pub fn fingerprint(image_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint(b"receipt image bytes");
        let b = fingerprint(b"receipt image bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_on_content() {
        assert_ne!(fingerprint(b"image-a"), fingerprint(b"image-b"));
    }

    #[test]
    fn test_fingerprint_known_vector() {
        // SHA-256 of the empty input
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex() {
        let fp = fingerprint(b"anything");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
