//! Salted password hashing with bcrypt.

use bcrypt::{BcryptError, hash, verify};

use crate::Error;

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Salt and hash `raw_password` with bcrypt at `cost`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidInput] if the password is empty, or an
    /// [Error::HashingError] if the password could not be hashed.
    pub fn new(raw_password: &str, cost: u32) -> Result<Self, Error> {
        if raw_password.is_empty() {
            return Err(Error::InvalidInput("Password cannot be empty.".to_owned()));
        }

        hash(raw_password, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash loaded from the database.
    ///
    /// A malformed hash makes [PasswordHash::verify] return an error.
    pub fn new_unchecked(stored_hash: &str) -> Self {
        Self(stored_hash.to_owned())
    }

    /// Whether `raw_password` hashes to this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod password_hash_tests {
    use crate::{Error, PasswordHash};

    #[test]
    fn stored_hash_verifies_original_password_only() {
        let stored = PasswordHash::new("pennies-add-up", 4)
            .unwrap()
            .as_ref()
            .to_owned();
        let hash = PasswordHash::new_unchecked(&stored);

        assert!(hash.verify("pennies-add-up").unwrap());
        assert!(!hash.verify("pennies-add-down").unwrap());
    }

    #[test]
    fn same_password_is_salted_differently() {
        let first = PasswordHash::new("save-more", 4).unwrap();
        let second = PasswordHash::new("save-more", 4).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_fails_to_verify() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        assert!(hash.verify("anything").is_err());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert_eq!(
            PasswordHash::new("", 4),
            Err(Error::InvalidInput("Password cannot be empty.".to_owned()))
        );
    }
}
