//! A plain Bloom filter over URL strings.
//!
//! Backs the service's fast-negative path: a URL the filter has never seen
//! is definitely not blacklisted, while a hit still needs confirmation from
//! the exact store. Removal is not supported here; forgetting is the exact
//! store's job.

use std::hash::{Hash, Hasher};

/// Fixed-size Bloom filter with `hashes` derived probe positions per key.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<bool>,
    hashes: u32,
}

impl BloomFilter {
    /// Create a filter with the given bit count and probe count.
    ///
    /// Degenerate parameters are clamped to at least one bit and one probe.
    #[must_use]
    pub fn new(bits: usize, hashes: u32) -> Self {
        Self {
            bits: vec![false; bits.max(1)],
            hashes: hashes.max(1),
        }
    }

    /// Mark a key as present.
    pub fn add(&mut self, key: &str) {
        for i in 0..self.hashes {
            let slot = self.probe(key, i);
            self.bits[slot] = true;
        }
    }

    /// Whether the key may have been added. `false` is definitive.
    #[must_use]
    pub fn possibly_contains(&self, key: &str) -> bool {
        (0..self.hashes).all(|i| self.bits[self.probe(key, i)])
    }

    fn probe(&self, key: &str, index: u32) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        index.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.bits.len() as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_keys_are_always_found() {
        let mut filter = BloomFilter::new(1024, 3);
        for i in 0..50 {
            filter.add(&format!("http://site-{i}.test"));
        }
        for i in 0..50 {
            assert!(filter.possibly_contains(&format!("http://site-{i}.test")));
        }
    }

    #[test]
    fn unseen_keys_are_mostly_absent() {
        let mut filter = BloomFilter::new(4096, 3);
        filter.add("http://evil.test");

        let misses = (0..100)
            .filter(|i| !filter.possibly_contains(&format!("http://clean-{i}.test")))
            .count();
        // A 4096-bit filter with a single entry has a vanishing false
        // positive rate; allow a handful of collisions.
        assert!(misses >= 95, "too many false positives: {}", 100 - misses);
    }

    #[test]
    fn degenerate_sizes_are_clamped() {
        let mut filter = BloomFilter::new(0, 0);
        filter.add("http://evil.test");
        assert!(filter.possibly_contains("http://evil.test"));
    }
}
