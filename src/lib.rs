//! Core classlint engine and detector registry.
//!
//! classlint scans compiled method bodies (control-flow graphs of
//! bytecode-level instructions) for API-misuse bugs: wakelock
//! acquire/release lifecycle violations and predictable SecureRandom seeds.
//! The crate exposes a [`ScanEngine`] that drives an explicit registry of
//! detectors over a class corpus and returns line-anchored diagnostics.

pub mod cfg;
pub mod cli;
pub mod config;
pub mod detector;
pub mod detectors;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod model;
pub mod provenance;
pub mod severity;
pub mod telemetry;

use crate::cfg::{Cfg, CfgError};
use crate::detector::{CallSite, DetectorRegistry, ScanContext, ScanSettings};
use crate::diagnostics::Diagnostic;
use crate::lifecycle::LifecycleTable;
use crate::model::{ClassModel, Insn};

/// A method skipped because its control flow could not be built. Surfaced
/// for external logging only, never as a user diagnostic.
#[derive(Debug)]
pub struct SkippedMethod {
    pub class: String,
    pub method: String,
    pub reason: CfgError,
}

/// Result of scanning one or more classes.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub skipped: Vec<SkippedMethod>,
}

/// Engine orchestrating a corpus scan: builds per-method CFGs and
/// dispatches matching call sites to the registered detectors.
pub struct ScanEngine {
    registry: DetectorRegistry,
    settings: ScanSettings,
}

impl ScanEngine {
    /// Create a new engine with default scan settings.
    pub fn new(registry: DetectorRegistry) -> Self {
        Self {
            registry,
            settings: ScanSettings::default(),
        }
    }

    /// Create a new engine with explicit settings (e.g. from config).
    pub fn new_with_settings(registry: DetectorRegistry, settings: ScanSettings) -> Self {
        Self { registry, settings }
    }

    /// Scan a single class. Detector instances are created fresh for the
    /// class and dropped afterwards, so no state survives into the next
    /// call. A method whose CFG cannot be built is recorded in
    /// `skipped` and the scan continues.
    pub fn scan_class(&self, class: &ClassModel) -> ScanOutcome {
        let mut detectors = self.registry.instantiate();
        let mut ctx = ScanContext::new(&class.source_file, &self.settings);
        let mut skipped = Vec::new();

        for detector in detectors.iter_mut() {
            detector.begin_class(class);
        }

        for method in &class.methods {
            let cfg = match Cfg::build(method) {
                Ok(cfg) => cfg,
                Err(err) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(
                        class = %class.name,
                        method = %method.name,
                        error = %err,
                        "skipping method with malformed control flow"
                    );
                    skipped.push(SkippedMethod {
                        class: class.name.clone(),
                        method: method.name.clone(),
                        reason: err,
                    });
                    continue;
                }
            };
            dispatch_method(&mut detectors, method, &cfg, &mut ctx);
        }

        for detector in detectors.iter_mut() {
            detector.finish_class(class, &mut ctx);
        }

        ScanOutcome {
            diagnostics: ctx.into_diagnostics(),
            skipped,
        }
    }

    /// Scan a whole corpus. Classes are independent; the reporter's final
    /// sort makes the result order-insensitive.
    pub fn scan_corpus<'a>(
        &self,
        classes: impl IntoIterator<Item = &'a ClassModel>,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for class in classes {
            let mut one = self.scan_class(class);
            outcome.diagnostics.append(&mut one.diagnostics);
            outcome.skipped.append(&mut one.skipped);
        }
        outcome
    }
}

fn dispatch_method(
    detectors: &mut [Box<dyn detector::Detector>],
    method: &model::Method,
    cfg: &Cfg,
    ctx: &mut ScanContext<'_>,
) {
    for (index, insn) in method.insns.iter().enumerate() {
        let Insn::Invoke {
            sig,
            receiver,
            args,
            ..
        } = insn
        else {
            continue;
        };
        // Pruned instructions have no block and are never dispatched.
        let Some(block) = cfg.block_of(index) else {
            continue;
        };
        for detector in detectors.iter_mut() {
            if detector.tracked_calls().iter().any(|p| p.matches(sig)) {
                let call = CallSite {
                    index,
                    block,
                    sig,
                    receiver: *receiver,
                    args,
                    method,
                    cfg,
                };
                detector.check_call(&call, ctx);
            }
        }
    }
}

/// Construct a `ScanEngine` with all built-in detectors and the default
/// lifecycle-ordering table.
pub fn create_default_engine() -> ScanEngine {
    ScanEngine::new(detectors::default_registry(LifecycleTable::android_defaults()))
}
