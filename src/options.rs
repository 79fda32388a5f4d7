//! Options controlling a validation pass.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Options shared by every component validation.
///
/// `head`, `tail` and `sample` restrict the per-value checks to a subset of
/// rows; rows selected by more than one of them are checked once. `lazy`
/// selects between collecting every failure and stopping at the first.
///
/// Options can be built in code or deserialized from configuration:
///
/// ```rust
/// use framecheck::ValidateOptions;
///
/// let options = ValidateOptions::new().lazy(true).head(2).tail(2);
/// assert_eq!(options.row_positions(5), Some(vec![0, 1, 3, 4]));
///
/// let from_config: ValidateOptions =
///     serde_json::from_str(r#"{"lazy": true, "sample": 3, "random_seed": 7}"#).unwrap();
/// assert!(from_config.is_lazy());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateOptions {
    head: Option<usize>,
    tail: Option<usize>,
    sample: Option<usize>,
    random_seed: Option<u64>,
    lazy: bool,
}

impl ValidateOptions {
    /// Fail-fast validation of every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates only the first `n` rows.
    pub fn head(mut self, n: usize) -> Self {
        self.head = Some(n);
        self
    }

    /// Validates only the last `n` rows.
    pub fn tail(mut self, n: usize) -> Self {
        self.tail = Some(n);
        self
    }

    /// Validates a random sample of `n` rows.
    pub fn sample(mut self, n: usize) -> Self {
        self.sample = Some(n);
        self
    }

    /// Seeds the row sampler.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Collects every failure instead of stopping at the first.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Returns true if failures are collected lazily.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Returns the sorted, de-duplicated rows to check out of `len` rows.
    ///
    /// `None` means every row.
    pub fn row_positions(&self, len: usize) -> Option<Vec<usize>> {
        if self.head.is_none() && self.tail.is_none() && self.sample.is_none() {
            return None;
        }

        let mut rows = Vec::new();
        if let Some(n) = self.head {
            rows.extend(0..n.min(len));
        }
        if let Some(n) = self.tail {
            rows.extend(len.saturating_sub(n)..len);
        }
        if let Some(n) = self.sample {
            let mut rng = match self.random_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            rows.extend(rand::seq::index::sample(&mut rng, len, n.min(len)).into_iter());
        }
        rows.sort_unstable();
        rows.dedup();
        Some(rows)
    }
}
