//! PNR generation
//!
//! Uniqueness is enforced by storage; a generator only has to draw
//! candidates.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;

use crate::constants::PNR_LENGTH;

pub trait PnrGenerator: Send + Sync {
    /// Draw a candidate PNR
    fn generate(&self) -> String;
}

/// Uniformly random 10-digit PNRs with a non-zero leading digit
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPnrGenerator;

impl PnrGenerator for RandomPnrGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut pnr = String::with_capacity(PNR_LENGTH);
        pnr.push(char::from(b'0' + rng.gen_range(1..=9u8)));
        for _ in 1..PNR_LENGTH {
            pnr.push(char::from(b'0' + rng.gen_range(0..=9u8)));
        }
        pnr
    }
}

/// Replays a fixed list of PNRs, then falls back to random draws
#[derive(Debug, Default)]
pub struct SequencePnrGenerator {
    queue: Mutex<VecDeque<String>>,
}

impl SequencePnrGenerator {
    pub fn new<I, S>(pnrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(pnrs.into_iter().map(Into::into).collect()),
        }
    }
}

impl PnrGenerator for SequencePnrGenerator {
    fn generate(&self) -> String {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| RandomPnrGenerator.generate())
    }
}

pub fn is_valid_pnr(pnr: &str) -> bool {
    pnr.len() == PNR_LENGTH && pnr.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_pnr_shape() {
        let generator = RandomPnrGenerator;
        for _ in 0..200 {
            let pnr = generator.generate();
            assert!(is_valid_pnr(&pnr), "bad pnr {}", pnr);
            assert!(!pnr.starts_with('0'));
        }
    }

    #[test]
    fn test_sequence_replays_then_randomises() {
        let generator = SequencePnrGenerator::new(["1111111111", "2222222222"]);
        assert_eq!(generator.generate(), "1111111111");
        assert_eq!(generator.generate(), "2222222222");
        assert!(is_valid_pnr(&generator.generate()));
    }

    #[test]
    fn test_pnr_validation() {
        assert!(is_valid_pnr("4213567890"));
        assert!(!is_valid_pnr("42135678"));
        assert!(!is_valid_pnr("42135678AB"));
    }
}
