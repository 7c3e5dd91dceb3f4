//! Activation token generation
//!
//! Tokens are random bytes from the operating system CSPRNG rendered as
//! lowercase hex.

use rand::{rngs::OsRng, RngCore};

/// Default token length in characters
pub const DEFAULT_TOKEN_LENGTH: usize = 16;

/// Generator for single-use activation tokens
#[derive(Debug, Clone)]
pub struct ActivationTokenGenerator {
    length: usize,
}

impl ActivationTokenGenerator {
    /// Create a generator producing tokens of `length` hex characters
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a new token
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.length.div_ceil(2)];
        OsRng.fill_bytes(&mut random_bytes);

        let mut token = hex::encode(random_bytes);
        token.truncate(self.length);
        token
    }
}

impl Default for ActivationTokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_length() {
        let token = ActivationTokenGenerator::default().generate();
        assert_eq!(token.len(), 16);
    }

    #[test]
    fn test_lowercase_hex_alphabet() {
        let token = ActivationTokenGenerator::new(64).generate();

        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_odd_length() {
        let token = ActivationTokenGenerator::new(7).generate();
        assert_eq!(token.len(), 7);
    }

    #[test]
    fn test_zero_length_is_clamped() {
        let generator = ActivationTokenGenerator::new(0);
        assert_eq!(generator.length(), 1);
        assert_eq!(generator.generate().len(), 1);
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let generator = ActivationTokenGenerator::default();
        let tokens: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();

        assert_eq!(tokens.len(), 1000);
    }
}
