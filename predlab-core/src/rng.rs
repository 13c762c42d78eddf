//! Deterministic RNG hierarchy.
//!
//! A master seed generates sub-seeds for each `(scope, stream, iteration)`
//! tuple via BLAKE3. Derivation does not depend on call order, so parallel
//! resampling produces the same draws regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one iteration of one stream.
    ///
    /// `scope` is usually a strategy id and `stream` a validation stage
    /// such as `"bootstrap"` or `"monte_carlo"`.
    pub fn sub_seed(&self, scope: &str, stream: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
        hasher.update(&(scope.len() as u64).to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&(stream.len() as u64).to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, scope: &str, stream: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, stream, iteration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let h = RngHierarchy::new(42);
        assert_eq!(
            h.sub_seed("longshot", "bootstrap", 7),
            h.sub_seed("longshot", "bootstrap", 7)
        );
    }

    #[test]
    fn streams_and_iterations_differ() {
        let h = RngHierarchy::new(42);
        let base = h.sub_seed("longshot", "bootstrap", 0);
        assert_ne!(base, h.sub_seed("longshot", "monte_carlo", 0));
        assert_ne!(base, h.sub_seed("longshot", "bootstrap", 1));
        assert_ne!(base, h.sub_seed("favorite", "bootstrap", 0));
    }

    #[test]
    fn concatenation_ambiguity_avoided() {
        let h = RngHierarchy::new(1);
        assert_ne!(h.sub_seed("ab", "c", 0), h.sub_seed("a", "bc", 0));
    }

    #[test]
    fn derivation_order_independent() {
        let h = RngHierarchy::new(42);
        let a1 = h.sub_seed("s", "bootstrap", 3);
        let b1 = h.sub_seed("s", "bootstrap", 9);
        let b2 = h.sub_seed("s", "bootstrap", 9);
        let a2 = h.sub_seed("s", "bootstrap", 3);
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
    }

    #[test]
    fn master_seed_changes_draws() {
        let mut r1 = RngHierarchy::new(42).rng_for("s", "mc", 0);
        let mut r2 = RngHierarchy::new(43).rng_for("s", "mc", 0);
        let x: u64 = r1.gen();
        let y: u64 = r2.gen();
        assert_ne!(x, y);
    }
}
