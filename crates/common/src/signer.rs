//! # Content Signer
//!
//! Binds an approval to the exact bytes that were approved.
//!
//! The signature covers the SHA-256 digest of the body, not the body itself.
//! Keeping the digest separate means the stored `content_hash` can be
//! compared on its own as a fast tamper check, and the signed payload is
//! 32 bytes no matter how long the post is.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::crypto::{PublicKey, SecretKey, Signature};

/// Size of a content digest in bytes
pub const CONTENT_HASH_SIZE: usize = 32;

/// SHA-256 digest of a content body, rendered as lowercase hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; CONTENT_HASH_SIZE]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; CONTENT_HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buff = [0u8; CONTENT_HASH_SIZE];
        hex::decode_to_slice(s.trim(), &mut buff)?;
        Ok(Self(buff))
    }
}

/// Deterministic digest of `content`
pub fn hash(content: &[u8]) -> ContentHash {
    ContentHash(Sha256::digest(content).into())
}

/// Sign the digest of `content`, returning the base64 signature
pub fn sign(content: &[u8], key: &SecretKey) -> String {
    let digest = hash(content);
    STANDARD.encode(key.sign(digest.as_bytes()).to_bytes())
}

/// Check `signature` over `content` against `public_key`.
///
/// Never errors: bad base64, a wrong-length signature or a signature from a
/// different key all come back as `false`.
pub fn verify(content: &[u8], signature: &str, public_key: &PublicKey) -> bool {
    let Ok(bytes) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&bytes) else {
        return false;
    };
    let digest = hash(content);
    public_key.verify(digest.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash(b"Hello"), hash(b"Hello"));
        assert_ne!(hash(b"Hello"), hash(b"Hello!"));
        assert_ne!(hash(b"Hello"), hash(b"hello"));
        assert_ne!(hash(b""), hash(b" "));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_display_round_trip() {
        let digest = hash(b"some post");
        let parsed: ContentHash = digest.to_string().parse().unwrap();
        assert_eq!(parsed, digest);
        assert!("zz".parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_sign_verify() {
        let key = SecretKey::generate().unwrap();
        let signature = sign(b"Hello", &key);

        assert!(verify(b"Hello", &signature, &key.public()));
        assert!(!verify(b"Hello.", &signature, &key.public()));
    }

    #[test]
    fn test_signature_covers_digest_only() {
        let key = SecretKey::generate().unwrap();
        let signature = sign(b"Hello", &key);

        let raw = STANDARD.decode(&signature).unwrap();
        let sig = Signature::from_slice(&raw).unwrap();
        assert!(key.public().verify(hash(b"Hello").as_bytes(), &sig).is_ok());
    }

    #[test]
    fn test_wrong_key_never_verifies() {
        let a = SecretKey::generate().unwrap();
        let b = SecretKey::generate().unwrap();
        for content in ["", "Hello", "a much longer post body\nwith lines"] {
            let signature = sign(content.as_bytes(), &a);
            assert!(!verify(content.as_bytes(), &signature, &b.public()));
        }
    }

    #[test]
    fn test_malformed_signatures_are_false() {
        let key = SecretKey::generate().unwrap();
        let public = key.public();

        assert!(!verify(b"Hello", "", &public));
        assert!(!verify(b"Hello", "not base64 at all!", &public));
        assert!(!verify(b"Hello", &STANDARD.encode([0u8; 10]), &public));
        assert!(!verify(b"Hello", &STANDARD.encode([0u8; 64]), &public));
    }
}
