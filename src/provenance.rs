//! Backward def-use walks over a method's CFG.
//!
//! Two queries live here. [`resolve_origin`] answers "which value is this
//! register holding" for receiver matching, and [`classify_value`] answers
//! "how predictable is this value" for seed checking. Both are recomputed
//! per query, walk reaching definitions backwards through NORMAL and
//! EXCEPTIONAL edges alike, and carry visited sets so loops and diamond
//! merges terminate. A merge of disagreeing answers degrades to the bottom
//! element (`Opaque` / `Unknown`) rather than guessing.

use crate::cfg::Cfg;
use crate::model::{Insn, Method, Reg};
use std::collections::HashSet;

/// Wall-clock time sources recognized by the seed classifier.
const TIME_SOURCES: &[(&str, &str)] = &[
    ("java/lang/System", "currentTimeMillis"),
    ("java/lang/System", "nanoTime"),
    ("java/util/Date", "getTime"),
    ("java/util/Calendar", "getTimeInMillis"),
];

/// Symbolic identity of the value a register holds at a program point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    /// Loaded from this field (any instance; fields are identified by name).
    Field { owner: String, field: String },
    /// Produced by the instruction at this index.
    Local(usize),
    /// No local definition reaches the use; the value is an incoming
    /// argument in this register.
    Argument(Reg),
    /// Conflicting reaching definitions or an unresolvable chain.
    Opaque,
}

/// Two origins are compatible when they are equal or either side is opaque.
/// Opaque matches everything: receiver matching must err towards "same
/// resource" to avoid false positives.
pub fn origins_compatible(a: &ValueOrigin, b: &ValueOrigin) -> bool {
    matches!(a, ValueOrigin::Opaque) || matches!(b, ValueOrigin::Opaque) || a == b
}

/// Statically inferred provenance of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Compile-time integer/long literal, constant-folded across moves and
    /// simple arithmetic.
    Constant(i64),
    /// Result of a wall-clock query, possibly after arithmetic.
    TimeDerived,
    /// Freshly allocated array populated only with constants.
    ConstantArray,
    Unknown,
}

/// Resolve the symbolic origin of `reg` as observed by the instruction at
/// `use_idx`.
pub fn resolve_origin(method: &Method, cfg: &Cfg, use_idx: usize, reg: Reg) -> ValueOrigin {
    let mut seen = HashSet::new();
    resolve_origin_inner(method, cfg, use_idx, reg, &mut seen)
}

fn resolve_origin_inner(
    method: &Method,
    cfg: &Cfg,
    use_idx: usize,
    reg: Reg,
    seen: &mut HashSet<(usize, Reg)>,
) -> ValueOrigin {
    let mut merged: Option<ValueOrigin> = None;
    for def in reaching_defs(method, cfg, use_idx, reg) {
        let origin = match def {
            DefSite::Entry => ValueOrigin::Argument(reg),
            DefSite::Insn(i) => {
                if seen.contains(&(i, reg)) {
                    // Copy cycle through a loop; nothing stronger to learn.
                    return ValueOrigin::Opaque;
                }
                seen.insert((i, reg));
                let origin = match &method.insns[i] {
                    Insn::GetField { owner, field, .. } => ValueOrigin::Field {
                        owner: owner.clone(),
                        field: field.clone(),
                    },
                    Insn::Move { src, .. } => resolve_origin_inner(method, cfg, i, *src, seen),
                    _ => ValueOrigin::Local(i),
                };
                seen.remove(&(i, reg));
                origin
            }
        };
        match &merged {
            None => merged = Some(origin),
            Some(prev) if *prev == origin => {}
            Some(_) => return ValueOrigin::Opaque,
        }
    }
    merged.unwrap_or(ValueOrigin::Opaque)
}

/// Classify the provenance of `reg` as observed by the instruction at
/// `use_idx`.
pub fn classify_value(method: &Method, cfg: &Cfg, use_idx: usize, reg: Reg) -> Provenance {
    let mut seen = HashSet::new();
    classify_inner(method, cfg, use_idx, reg, &mut seen)
}

fn classify_inner(
    method: &Method,
    cfg: &Cfg,
    use_idx: usize,
    reg: Reg,
    seen: &mut HashSet<usize>,
) -> Provenance {
    let mut merged: Option<Provenance> = None;
    for def in reaching_defs(method, cfg, use_idx, reg) {
        let p = match def {
            DefSite::Entry => Provenance::Unknown,
            DefSite::Insn(i) => {
                if seen.contains(&i) {
                    return Provenance::Unknown;
                }
                seen.insert(i);
                let p = classify_def(method, cfg, i, seen);
                seen.remove(&i);
                p
            }
        };
        match &merged {
            None => merged = Some(p),
            // Merging requires exact agreement, literal value included;
            // anything else degrades to Unknown.
            Some(prev) if *prev == p => {}
            Some(_) => return Provenance::Unknown,
        }
    }
    merged.unwrap_or(Provenance::Unknown)
}

fn classify_def(method: &Method, cfg: &Cfg, def_idx: usize, seen: &mut HashSet<usize>) -> Provenance {
    match &method.insns[def_idx] {
        Insn::Const { value, .. } => Provenance::Constant(*value),
        Insn::Move { src, .. } => classify_inner(method, cfg, def_idx, *src, seen),
        Insn::Binary { op, lhs, rhs, .. } => {
            let l = classify_inner(method, cfg, def_idx, *lhs, seen);
            let r = classify_inner(method, cfg, def_idx, *rhs, seen);
            match (l, r) {
                (Provenance::Constant(a), Provenance::Constant(b)) => {
                    Provenance::Constant(op.fold(a, b))
                }
                (Provenance::TimeDerived, Provenance::Constant(_))
                | (Provenance::Constant(_), Provenance::TimeDerived)
                | (Provenance::TimeDerived, Provenance::TimeDerived) => Provenance::TimeDerived,
                _ => Provenance::Unknown,
            }
        }
        Insn::Invoke { sig, .. } => {
            let is_time = TIME_SOURCES
                .iter()
                .any(|(owner, name)| sig.owner == *owner && sig.name == *name);
            if is_time {
                Provenance::TimeDerived
            } else {
                Provenance::Unknown
            }
        }
        Insn::NewArray { .. } => classify_array(method, cfg, def_idx, seen),
        _ => Provenance::Unknown,
    }
}

/// A fresh array is a constant seed when every store that may target it
/// stores a constant. An unpopulated array is zero-filled, which is just as
/// fixed. Any store of unknown provenance poisons the whole array; arrays
/// arriving through parameters or fields never get here and stay UNKNOWN
/// (the accepted interprocedural false negative).
fn classify_array(
    method: &Method,
    cfg: &Cfg,
    alloc_idx: usize,
    seen: &mut HashSet<usize>,
) -> Provenance {
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::ArrayPut { array, value, .. } = insn else {
            continue;
        };
        if cfg.block_of(i).is_none() {
            // Pruned stores never execute.
            continue;
        }
        let target = resolve_origin(method, cfg, i, *array);
        let may_alias = match &target {
            ValueOrigin::Local(def) => *def == alloc_idx,
            ValueOrigin::Opaque => true,
            _ => false,
        };
        if !may_alias {
            continue;
        }
        match classify_inner(method, cfg, i, *value, seen) {
            Provenance::Constant(_) => {}
            _ => return Provenance::Unknown,
        }
    }
    Provenance::ConstantArray
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DefSite {
    Insn(usize),
    Entry,
}

/// Definitions of `reg` that reach `use_idx`, collected by a backward walk
/// over the block graph. Revisiting the use's own block through a loop scans
/// it in full, so a definition textually after the use still reaches it
/// along the back edge.
fn reaching_defs(method: &Method, cfg: &Cfg, use_idx: usize, reg: Reg) -> Vec<DefSite> {
    let Some(start_block) = cfg.block_of(use_idx) else {
        return Vec::new();
    };
    let preds = cfg.predecessors();
    let mut defs = Vec::new();
    let mut record = |site: DefSite, defs: &mut Vec<DefSite>| {
        if !defs.contains(&site) {
            defs.push(site);
        }
    };

    // Partial scan of the use's block, from just above the use.
    let block = &cfg.blocks[start_block];
    for i in (block.start..use_idx).rev() {
        if method.insns[i].def() == Some(reg) {
            record(DefSite::Insn(i), &mut defs);
            return defs;
        }
    }

    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack: Vec<usize> = preds[start_block].clone();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if id == cfg.entry {
            record(DefSite::Entry, &mut defs);
            continue;
        }
        let block = &cfg.blocks[id];
        let mut found = false;
        for i in (block.start..block.end).rev() {
            if method.insns[i].def() == Some(reg) {
                record(DefSite::Insn(i), &mut defs);
                found = true;
                break;
            }
        }
        if !found {
            stack.extend(preds[id].iter().copied());
        }
    }
    defs
}
