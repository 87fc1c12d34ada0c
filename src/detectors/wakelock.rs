//! Wakelock acquire/release lifecycle detector.
//!
//! For every `acquire()` on a wakelock receiver, decides whether a matching
//! `release()` on the same receiver is guaranteed before every exit the
//! acquire can reach. Three verdicts exist, checked in order:
//!
//! 1. No `release()` anywhere in the class: one coarse diagnostic per
//!    acquire, so the same site is never double-reported.
//! 2. Every release lives in the late half of a recognized lifecycle pair
//!    while the lock is taken earlier: a pairing diagnostic at each release.
//! 3. Otherwise, a must-reach check per acquire whose method also contains a
//!    matching release; an acquire whose release lives in a different
//!    method is left to the host framework (no reachability diagnostic).

use crate::detector::{
    CallPattern, CallSite, Detector, DetectorCategory, DetectorDescriptor, ScanContext,
};
use crate::lifecycle::LifecycleTable;
use crate::model::{ClassModel, Insn};
use crate::provenance::{ValueOrigin, origins_compatible, resolve_origin};

pub static WAKELOCK: DetectorDescriptor = DetectorDescriptor {
    name: "wakelock",
    category: DetectorCategory::Resource,
    description: "Finds wakelock acquire() calls that are not guaranteed to be released",
};

const WAKE_LOCK_OWNER: &str = "android/os/PowerManager$WakeLock";

const TRACKED: &[CallPattern] = &[
    CallPattern::new(WAKE_LOCK_OWNER, "acquire"),
    CallPattern::new(WAKE_LOCK_OWNER, "release"),
];

pub const MSG_NO_RELEASE: &str = "Found a wakelock acquire() but no release() calls anywhere";
pub const MSG_NOT_ALWAYS_REACHED: &str = "The release() call is not always reached";

#[derive(Debug)]
struct AcquireSite {
    method: String,
    line: u32,
    /// Must-reach verdict, present only when the same method contains a
    /// release on a compatible receiver.
    always_released: Option<bool>,
}

#[derive(Debug)]
struct ReleaseSite {
    method: String,
    line: u32,
}

/// Class-scoped acquire/release tracking; one instance per class.
pub struct WakelockDetector {
    lifecycle: LifecycleTable,
    acquires: Vec<AcquireSite>,
    releases: Vec<ReleaseSite>,
}

impl WakelockDetector {
    pub fn new(lifecycle: LifecycleTable) -> Self {
        Self {
            lifecycle,
            acquires: Vec::new(),
            releases: Vec::new(),
        }
    }
}

impl Detector for WakelockDetector {
    fn descriptor(&self) -> &'static DetectorDescriptor {
        &WAKELOCK
    }

    fn tracked_calls(&self) -> &'static [CallPattern] {
        TRACKED
    }

    fn check_call(&mut self, call: &CallSite<'_>, _ctx: &mut ScanContext<'_>) {
        match call.sig.name.as_str() {
            "acquire" => {
                self.acquires.push(AcquireSite {
                    method: call.method.name.clone(),
                    line: call.line(),
                    always_released: release_always_reached(call),
                });
            }
            "release" => {
                self.releases.push(ReleaseSite {
                    method: call.method.name.clone(),
                    line: call.line(),
                });
            }
            _ => {}
        }
    }

    fn finish_class(&mut self, _class: &ClassModel, ctx: &mut ScanContext<'_>) {
        if self.acquires.is_empty() {
            return;
        }
        self.acquires.sort_by_key(|a| a.line);

        if self.releases.is_empty() {
            for acquire in &self.acquires {
                ctx.report(&WAKELOCK, acquire.line, MSG_NO_RELEASE);
            }
            return;
        }

        if let Some(pair) = self.late_release_pair() {
            let message = format!(
                "Wakelocks should be released in {}, not {}",
                pair.0, pair.1
            );
            for release in self.releases.iter().filter(|r| r.method == pair.1) {
                ctx.report(&WAKELOCK, release.line, message.clone());
            }
            return;
        }

        for acquire in &self.acquires {
            if acquire.always_released == Some(false) {
                ctx.report(&WAKELOCK, acquire.line, MSG_NOT_ALWAYS_REACHED);
            }
        }
    }
}

impl WakelockDetector {
    /// (earlier, later) names when every release sits in the late callback
    /// of a recognized pair while some acquire takes the lock elsewhere.
    fn late_release_pair(&self) -> Option<(String, String)> {
        let first = &self.releases[0];
        let pair = self.lifecycle.pair_with_later(&first.method)?;
        let all_late = self.releases.iter().all(|r| r.method == pair.later);
        let acquired_earlier = self.acquires.iter().any(|a| a.method != pair.later);
        (all_late && acquired_earlier).then(|| (pair.earlier.clone(), pair.later.clone()))
    }
}

/// Must-reach analysis for one acquire site.
///
/// Returns `None` when the enclosing method has no release on a compatible
/// receiver, `Some(true)` when every path from the acquire to every exit
/// passes such a release, `Some(false)` otherwise.
fn release_always_reached(call: &CallSite<'_>) -> Option<bool> {
    let method = call.method;
    let cfg = call.cfg;
    let acquire_origin = match call.receiver {
        Some(reg) => resolve_origin(method, cfg, call.index, reg),
        None => ValueOrigin::Opaque,
    };

    // Release sites on a receiver the acquire may alias, reachable code only.
    let releases: Vec<usize> = method
        .insns
        .iter()
        .enumerate()
        .filter_map(|(i, insn)| match insn {
            Insn::Invoke { sig, receiver, .. }
                if sig.owner == WAKE_LOCK_OWNER && sig.name == "release" =>
            {
                cfg.block_of(i)?;
                let origin = match receiver {
                    Some(reg) => resolve_origin(method, cfg, i, *reg),
                    None => ValueOrigin::Opaque,
                };
                origins_compatible(&acquire_origin, &origin).then_some(i)
            }
            _ => None,
        })
        .collect();

    if releases.is_empty() {
        return None;
    }

    let block_has_release =
        |start: usize, end: usize| releases.iter().any(|&i| start <= i && i < end);

    // Greatest fixpoint: a block is safe when every path from its first
    // instruction to an exit passes a release. Pure cycles that never reach
    // an exit stay safe; they have no exit-bound path to miss the release.
    let mut safe = vec![true; cfg.blocks.len()];
    loop {
        let mut changed = false;
        for (id, block) in cfg.blocks.iter().enumerate() {
            if !safe[id] || block_has_release(block.start, block.end) {
                continue;
            }
            let now_unsafe =
                block.exit.is_some() || block.succs.iter().any(|&(succ, _)| !safe[succ]);
            if now_unsafe {
                safe[id] = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // The acquire's own block counts only releases after the acquire.
    let block = &cfg.blocks[call.block];
    if block_has_release(call.index + 1, block.end) {
        return Some(true);
    }
    if block.exit.is_some() {
        return Some(false);
    }
    Some(block.succs.iter().all(|&(succ, _)| safe[succ]))
}
