//! Detector contract and registry.
//!
//! A detector declares the call signatures it wants to observe; the engine
//! dispatches every matching [`CallSite`] to it together with read access to
//! the enclosing method's CFG. Detectors are instantiated fresh for every
//! analyzed class, so any state they accumulate is class-scoped by
//! construction and can never leak across classes. The registry is built
//! explicitly at process start; there is no runtime discovery.

use crate::cfg::{BlockId, Cfg};
use crate::diagnostics::Diagnostic;
use crate::model::{ClassModel, Method, MethodSig, Reg};
use crate::severity::Severity;
use std::collections::HashMap;

/// Call signature a detector registers interest in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPattern {
    pub owner: &'static str,
    pub name: &'static str,
}

impl CallPattern {
    pub const fn new(owner: &'static str, name: &'static str) -> Self {
        Self { owner, name }
    }

    pub fn matches(&self, sig: &MethodSig) -> bool {
        sig.owner == self.owner && sig.name == self.name
    }
}

/// High-level grouping of detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectorCategory {
    /// Resource-lifecycle contracts (acquire/release pairing).
    Resource,
    /// Security-sensitive API misuse.
    Security,
}

impl DetectorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorCategory::Resource => "resource",
            DetectorCategory::Security => "security",
        }
    }
}

/// Static metadata describing a detector.
#[derive(Debug)]
pub struct DetectorDescriptor {
    pub name: &'static str,
    pub category: DetectorCategory,
    pub description: &'static str,
}

/// A matched invocation inside one method, with its CFG context.
///
/// A call site only references the method and CFG it came from; both always
/// belong to the class currently under analysis.
pub struct CallSite<'a> {
    /// Instruction index of the invoke.
    pub index: usize,
    /// Block containing the invoke.
    pub block: BlockId,
    pub sig: &'a MethodSig,
    pub receiver: Option<Reg>,
    pub args: &'a [Reg],
    pub method: &'a Method,
    pub cfg: &'a Cfg,
}

impl CallSite<'_> {
    /// Source line of the invoke, per the method's line mapping table.
    pub fn line(&self) -> u32 {
        self.method.line_at(self.index)
    }
}

/// A detector observing call sites within one class.
pub trait Detector {
    fn descriptor(&self) -> &'static DetectorDescriptor;

    /// Signatures this detector wants dispatched.
    fn tracked_calls(&self) -> &'static [CallPattern];

    fn begin_class(&mut self, _class: &ClassModel) {}

    fn check_call(&mut self, call: &CallSite<'_>, ctx: &mut ScanContext<'_>);

    /// Invoked after every method of the class has been dispatched; the
    /// place for class-scoped verdicts.
    fn finish_class(&mut self, _class: &ClassModel, _ctx: &mut ScanContext<'_>) {}
}

/// Per-detector severity configuration derived from `classlint.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSettings {
    levels: HashMap<String, Severity>,
}

impl ScanSettings {
    #[must_use]
    pub fn with_config_levels(mut self, levels: HashMap<String, Severity>) -> Self {
        self.levels.extend(levels);
        self
    }

    #[must_use]
    pub fn disable(mut self, disabled: impl IntoIterator<Item = String>) -> Self {
        for name in disabled {
            self.levels.insert(name, Severity::Allow);
        }
        self
    }

    pub fn level_for(&self, detector_name: &str) -> Severity {
        self.levels.get(detector_name).copied().unwrap_or_default()
    }
}

/// Mutable context passed to detectors while scanning one class.
pub struct ScanContext<'a> {
    file: &'a str,
    settings: &'a ScanSettings,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ScanContext<'a> {
    pub fn new(file: &'a str, settings: &'a ScanSettings) -> Self {
        Self {
            file,
            settings,
            diagnostics: Vec::new(),
        }
    }

    pub fn report(
        &mut self,
        detector: &'static DetectorDescriptor,
        line: u32,
        message: impl Into<String>,
    ) {
        let severity = self.settings.level_for(detector.name);
        if severity == Severity::Allow {
            return;
        }
        self.diagnostics.push(Diagnostic {
            detector,
            severity,
            file: self.file.to_string(),
            line,
            message: message.into(),
        });
    }

    pub fn file(&self) -> &str {
        self.file
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

type DetectorFactory = Box<dyn Fn() -> Box<dyn Detector> + Send + Sync>;

/// Explicit, statically constructed list of detector factories. One instance
/// per factory is created for each analyzed class.
pub struct DetectorRegistry {
    entries: Vec<(&'static DetectorDescriptor, DetectorFactory)>,
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(descriptor, _)| descriptor.name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_detector<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Detector> + Send + Sync + 'static,
    {
        let descriptor = factory().descriptor();
        self.entries.push((descriptor, Box::new(factory)));
        self
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static DetectorDescriptor> + '_ {
        self.entries.iter().map(|(d, _)| *d)
    }

    pub fn find_descriptor(&self, name: &str) -> Option<&'static DetectorDescriptor> {
        self.descriptors().find(|d| d.name == name)
    }

    /// Fresh detector instances for one class.
    pub fn instantiate(&self) -> Vec<Box<dyn Detector>> {
        self.entries.iter().map(|(_, f)| f()).collect()
    }

    pub fn retain(&mut self, keep: impl Fn(&DetectorDescriptor) -> bool) {
        self.entries.retain(|(d, _)| keep(d));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
