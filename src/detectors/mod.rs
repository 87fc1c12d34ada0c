//! Built-in detectors.

pub mod secure_random;
pub mod wakelock;

use crate::detector::DetectorRegistry;
use crate::lifecycle::LifecycleTable;
use anyhow::{Result, anyhow};

pub use secure_random::SecureRandomDetector;
pub use wakelock::WakelockDetector;

/// Registry with every built-in detector enabled.
pub fn default_registry(lifecycle: LifecycleTable) -> DetectorRegistry {
    DetectorRegistry::new()
        .with_detector(move || Box::new(WakelockDetector::new(lifecycle.clone())))
        .with_detector(|| Box::new(SecureRandomDetector))
}

/// Registry filtered by `--only` / `--skip` selections.
///
/// # Errors
///
/// Returns an error if any selected name is not a known detector.
pub fn default_registry_filtered(
    lifecycle: LifecycleTable,
    only: &[String],
    skip: &[String],
) -> Result<DetectorRegistry> {
    let mut registry = default_registry(lifecycle);

    for name in only.iter().chain(skip.iter()) {
        if registry.find_descriptor(name).is_none() {
            return Err(anyhow!("unknown detector: {name}"));
        }
    }

    let only: Vec<&str> = only.iter().map(String::as_str).collect();
    let skip: Vec<&str> = skip.iter().map(String::as_str).collect();
    registry.retain(|d| {
        (only.is_empty() || only.contains(&d.name)) && !skip.contains(&d.name)
    });
    Ok(registry)
}
