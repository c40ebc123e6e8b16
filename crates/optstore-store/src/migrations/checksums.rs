use sha2::{Digest, Sha256};

/// Hex SHA-256 of a migration script
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_sha256_hex() {
        let checksum = compute_checksum("SELECT 1");
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_changes_with_content() {
        assert_eq!(compute_checksum("a"), compute_checksum("a"));
        assert_ne!(compute_checksum("a"), compute_checksum("b"));
    }
}
