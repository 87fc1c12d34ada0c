//! Externally supplied lifecycle-callback ordering.
//!
//! The wakelock detector never invents callback semantics; it consumes this
//! table as opaque ordering metadata. The CLI supplies it from config, with
//! an Android-flavored default.

use serde::{Deserialize, Serialize};

/// One recognized pair of lifecycle callbacks: the host framework invokes
/// `earlier` before `later` when tearing the component down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePair {
    pub earlier: String,
    pub later: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleTable {
    #[serde(default)]
    pairs: Vec<LifecyclePair>,
}

impl LifecycleTable {
    pub fn new(pairs: Vec<LifecyclePair>) -> Self {
        Self { pairs }
    }

    /// The pairing every Android activity gets: pause runs before destroy.
    pub fn android_defaults() -> Self {
        Self::new(vec![LifecyclePair {
            earlier: "onPause".to_string(),
            later: "onDestroy".to_string(),
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[LifecyclePair] {
        &self.pairs
    }

    /// Pair whose late callback is the given method name, if any.
    pub fn pair_with_later(&self, method: &str) -> Option<&LifecyclePair> {
        self.pairs.iter().find(|p| p.later == method)
    }
}
