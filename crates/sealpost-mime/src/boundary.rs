//! Boundary delimiter generation for multipart containers.
//!
//! A boundary has the form `=-=NN-SUFFIX=-=`. `NN` is a counter that
//! increases with every container of one message, and `SUFFIX` is a
//! random nonce drawn once per message. The nonce keeps a hostile body
//! from guessing the delimiter and closing its container early.

use std::io;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::encoding::encode_zbase32;
use crate::error::{Error, Result};

/// Number of random bytes behind the boundary suffix.
const NONCE_LEN: usize = 8;

/// Generates boundaries for the containers of one message.
#[derive(Debug, Clone, Default)]
pub struct BoundaryGenerator {
    counter: u32,
    suffix: Option<String>,
}

impl BoundaryGenerator {
    /// Creates a generator; no entropy is drawn until the first boundary.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: 0,
            suffix: None,
        }
    }

    /// Generates the next boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the operating system
    /// cannot supply randomness or the counter is exhausted.
    pub fn next_boundary(&mut self) -> Result<String> {
        let counter = self.counter.checked_add(1).ok_or_else(|| {
            Error::ResourceExhausted(io::Error::other("boundary counter overflow"))
        })?;
        let suffix = self.suffix()?;
        let boundary = format!("=-={counter:02}-{suffix}=-=");
        self.counter = counter;
        tracing::trace!(counter, "Generated boundary");
        Ok(boundary)
    }

    /// Returns the number of boundaries generated so far.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.counter
    }

    /// Returns the random suffix, if one has been drawn.
    #[must_use]
    pub fn current_suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    fn suffix(&mut self) -> Result<String> {
        if let Some(suffix) = &self.suffix {
            return Ok(suffix.clone());
        }

        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| Error::ResourceExhausted(io::Error::other(e)))?;
        let suffix = encode_zbase32(&nonce);
        self.suffix = Some(suffix.clone());
        Ok(suffix)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_suffix() {
        let mut generator = BoundaryGenerator::new();
        assert!(generator.current_suffix().is_none());
        assert_eq!(generator.count(), 0);

        let _ = generator.next_boundary().unwrap();
        assert_eq!(generator.current_suffix().map(str::len), Some(13));
        assert_eq!(generator.count(), 1);
    }

    #[test]
    fn test_format_and_sequence() {
        let mut generator = BoundaryGenerator::new();
        let first = generator.next_boundary().unwrap();
        let second = generator.next_boundary().unwrap();
        let third = generator.next_boundary().unwrap();
        let suffix = generator.current_suffix().unwrap();

        assert_eq!(first, format!("=-=01-{suffix}=-="));
        assert_eq!(second, format!("=-=02-{suffix}=-="));
        assert_eq!(third, format!("=-=03-{suffix}=-="));
    }

    #[test]
    fn test_counter_grows_past_two_digits() {
        let mut generator = BoundaryGenerator::new();
        for _ in 0..99 {
            let _ = generator.next_boundary().unwrap();
        }
        let boundary = generator.next_boundary().unwrap();
        assert!(boundary.starts_with("=-=100-"));
    }

    #[test]
    fn test_independent_generators_differ() {
        let mut a = BoundaryGenerator::new();
        let mut b = BoundaryGenerator::new();
        let _ = a.next_boundary().unwrap();
        let _ = b.next_boundary().unwrap();
        assert_ne!(a.current_suffix(), b.current_suffix());
    }

    #[test]
    fn test_counter_overflow() {
        let mut generator = BoundaryGenerator::new();
        generator.counter = u32::MAX;
        let err = generator.next_boundary().unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted(_)));
        assert_eq!(generator.count(), u32::MAX);
    }
}
