use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{Error, ErrorKind};

const PREFIX: &str = "RUNE-";
const RANDOM_LENGTH: usize = 14;
const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Secret proving ownership of a published package.
///
/// Only its [digest](SecretKey::digest) ever leaves the machine; the key
/// itself is shown to the author once and never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);
impl SecretKey {
    /// `RUNE-` followed by 14 random characters from `A-Z0-9`.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let random: String = (0..RANDOM_LENGTH)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(format!("{PREFIX}{random}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase hex SHA-256 of the key.
    ///
    /// ```
    /// use deltahub_remote::SecretKey;
    /// let key: SecretKey = "abc".parse().unwrap();
    /// assert_eq!(
    ///     key.digest().as_str(),
    ///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    /// );
    /// ```
    pub fn digest(&self) -> HashedKey {
        let digest = Sha256::digest(self.0.as_bytes());
        HashedKey(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Whether the key has the shape [`generate`](Self::generate) produces.
    pub fn is_generated_shape(&self) -> bool {
        self.0.strip_prefix(PREFIX).is_some_and(|random| {
            random.len() == RANDOM_LENGTH && random.bytes().all(|byte| ALPHABET.contains(&byte))
        })
    }
}
impl FromStr for SecretKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if key.is_empty() {
            exn::bail!(ErrorKind::InvalidKey);
        }
        Ok(Self(key.to_string()))
    }
}
impl Display for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
// Keep secrets out of logs and panic messages.
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SecretKey(..)")
    }
}

/// The transmitted form of a [`SecretKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashedKey(String);
impl HashedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for HashedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
