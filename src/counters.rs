use std::sync::atomic::{AtomicU64, Ordering};

/// Hit and miss counts for lookups against a [`crate::Map`].
///
/// Attach one with [`crate::Map::open_with_counters`]; share it through an
/// `Arc` to aggregate several maps.
#[derive(Debug, Default)]
pub struct LookupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that found their key, or 0.0 before any lookup.
    pub fn ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_ratio() {
        let counters = LookupCounters::new();
        assert_eq!(counters.ratio(), 0.0);

        counters.hit();
        counters.hit();
        counters.hit();
        counters.miss();

        assert_eq!(counters.hits(), 3);
        assert_eq!(counters.misses(), 1);
        assert_eq!(counters.ratio(), 0.75);

        counters.reset();
        assert_eq!(counters.hits(), 0);
        assert_eq!(counters.misses(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let counters = Arc::new(LookupCounters::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for i in 0..1000 {
                        if i % 2 == 0 {
                            counters.hit();
                        } else {
                            counters.miss();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.hits(), 4000);
        assert_eq!(counters.misses(), 4000);
    }
}
