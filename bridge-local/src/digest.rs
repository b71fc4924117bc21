//! Digest cycle implementations

use bridge_traits::DigestCycle;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ignores digest requests. For hosts without change detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDigest;

impl DigestCycle for NoopDigest {
    fn schedule_digest(&self) {}
}

/// Counts digest requests.
#[derive(Debug, Default)]
pub struct CountingDigest {
    count: AtomicUsize,
}

impl CountingDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl DigestCycle for CountingDigest {
    fn schedule_digest(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_digest() {
        let digest = CountingDigest::new();
        digest.schedule_digest();
        digest.schedule_digest();
        assert_eq!(digest.count(), 2);
    }
}
