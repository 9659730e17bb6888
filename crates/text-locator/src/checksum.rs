use blake3::Hasher;

pub const CHECKSUM_PREFIX: &str = "b3";

const FIELD_SEPARATOR: u8 = 0x1f;

/// Content checksum over the selection and its surrounding context.
pub fn content_checksum(before: &str, selected: &str, after: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(before.as_bytes());
    hasher.update(&[FIELD_SEPARATOR]);
    hasher.update(selected.as_bytes());
    hasher.update(&[FIELD_SEPARATOR]);
    hasher.update(after.as_bytes());
    format!("{}_{}", CHECKSUM_PREFIX, hasher.finalize().to_hex())
}

pub fn verify_checksum(expected: &str, before: &str, selected: &str, after: &str) -> bool {
    !expected.is_empty() && content_checksum(before, selected, after) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let a = content_checksum("offers ", "Type Safety", " and");
        let b = content_checksum("offers ", "Type Safety", " and");
        assert_eq!(a, b);
        assert!(a.starts_with("b3_"));
        assert_eq!(a.len(), 3 + 64);
    }

    #[test]
    fn field_boundaries_matter() {
        assert_ne!(
            content_checksum("ab", "c", ""),
            content_checksum("a", "bc", "")
        );
    }

    #[test]
    fn verify_rejects_empty_and_stale_checksums() {
        let sum = content_checksum("", "text", "");
        assert!(verify_checksum(&sum, "", "text", ""));
        assert!(!verify_checksum(&sum, "", "text!", ""));
        assert!(!verify_checksum("", "", "text", ""));
    }
}
