//! Resource identity.

use sha2::{Digest, Sha256};

/// Identifier for a resource created by `command`: hex-encoded SHA-256 of
/// the composed create command.
///
/// Identical create commands yield identical identifiers, even across
/// otherwise different configurations.
pub fn resource_id(command: &str) -> String {
    hex::encode(Sha256::digest(command.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            resource_id("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = resource_id("echo \"hi\" > t1");
        let b = resource_id("echo \"hi\" > t1");
        let c = resource_id("echo \"hi\" > t2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
