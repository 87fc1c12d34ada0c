//! Predictable SecureRandom seed detector.
//!
//! Tracks both call shapes that seed a generator: the seeding constructor
//! and explicit `setSeed()` calls. The seed argument is classified by a
//! backward def-use walk; constants (including constant-only arrays) and
//! time-derived values are flagged, anything of unknown provenance is left
//! alone. Tracing a seed array through callees is deliberately out of
//! scope, so an array arriving via a parameter or field is never flagged.

use crate::detector::{
    CallPattern, CallSite, Detector, DetectorCategory, DetectorDescriptor, ScanContext,
};
use crate::provenance::{Provenance, classify_value};

pub static SECURE_RANDOM: DetectorDescriptor = DetectorDescriptor {
    name: "secure_random",
    category: DetectorCategory::Security,
    description: "Flags SecureRandom seeds that are constant or derived from the current time",
};

const SECURE_RANDOM_OWNER: &str = "java/security/SecureRandom";

const TRACKED: &[CallPattern] = &[
    CallPattern::new(SECURE_RANDOM_OWNER, "<init>"),
    CallPattern::new(SECURE_RANDOM_OWNER, "setSeed"),
];

pub const MSG_SET_SEED_FIXED: &str =
    "Do not call setSeed() on a SecureRandom with a fixed seed: it is not secure. Use getSeed().";
pub const MSG_CTOR_FIXED: &str =
    "Do not pass a fixed seed to SecureRandom. It is not secure. Use getSeed().";
pub const MSG_TIME_SEED: &str = "It is dangerous to seed SecureRandom with the current time \
     because that value is more predictable to an attacker than the default seed.";

pub struct SecureRandomDetector;

impl Detector for SecureRandomDetector {
    fn descriptor(&self) -> &'static DetectorDescriptor {
        &SECURE_RANDOM
    }

    fn tracked_calls(&self) -> &'static [CallPattern] {
        TRACKED
    }

    fn check_call(&mut self, call: &CallSite<'_>, ctx: &mut ScanContext<'_>) {
        // The no-arg constructor takes the default seed; nothing to check.
        let Some(&seed) = call.args.first() else {
            return;
        };

        let message = match classify_value(call.method, call.cfg, call.index, seed) {
            Provenance::Constant(_) | Provenance::ConstantArray => {
                if call.sig.name == "<init>" {
                    MSG_CTOR_FIXED
                } else {
                    MSG_SET_SEED_FIXED
                }
            }
            Provenance::TimeDerived => MSG_TIME_SEED,
            Provenance::Unknown => return,
        };
        ctx.report(&SECURE_RANDOM, call.line(), message);
    }
}
