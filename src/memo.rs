//! Single-slot memoization keyed by the exact inputs of a derivation

/// Caches the last computed value together with the inputs it came from.
/// A lookup with equal inputs returns the cached value; anything else
/// recomputes and replaces it.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    computations: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            computations: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> &V {
        let hit = matches!(&self.slot, Some((cached, _)) if *cached == key);
        if !hit {
            self.slot = None;
        }
        let computations = &mut self.computations;
        let (_, value) = self.slot.get_or_insert_with(|| {
            *computations += 1;
            let value = compute(&key);
            (key, value)
        });
        value
    }

    /// Number of times the value was actually computed
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
