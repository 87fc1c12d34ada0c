//! Control-flow graph construction for one method body.
//!
//! Blocks are maximal straight-line runs. Edges are tagged NORMAL or
//! EXCEPTIONAL; exception-table coverage is modeled as explicit edges so the
//! must-reach analysis can treat "exceptional exit without a release" the
//! same way it treats a normal one. Blocks unreachable from the entry are
//! pruned at build time: they can never contribute to an "is X always
//! reached" query and would otherwise bias it.

use crate::model::{Insn, Method};
use std::collections::{BTreeSet, VecDeque};
use thiserror::Error;

pub type BlockId = usize;

/// Malformed control-flow input. One bad method is skipped, never fatal to
/// the corpus scan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CfgError {
    #[error("branch at {index} targets out-of-range offset {target}")]
    BranchOutOfRange { index: usize, target: u32 },

    #[error("instruction stream falls off the method end after {index}")]
    FallsOffEnd { index: usize },

    #[error("exception handler targets out-of-range offset {handler}")]
    HandlerOutOfRange { handler: u32 },

    #[error("malformed try range [{start}, {end})")]
    MalformedTryRange { start: u32, end: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Normal,
    Exceptional,
}

/// Exit flavor of a block with out-degree 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Block ends in a return.
    Return,
    /// Block ends in a throw no handler covers.
    UncaughtThrow,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// First instruction index, inclusive.
    pub start: usize,
    /// Past-the-end instruction index.
    pub end: usize,
    pub succs: Vec<(BlockId, EdgeKind)>,
    pub exit: Option<ExitKind>,
}

impl BasicBlock {
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn insns<'m>(&self, method: &'m Method) -> &'m [Insn] {
        &method.insns[self.start..self.end]
    }
}

/// Immutable per-method control-flow graph.
///
/// `blocks[entry]` is a synthetic empty entry block with in-degree 0; every
/// other block is reachable from it.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
}

impl Cfg {
    pub fn build(method: &Method) -> Result<Cfg, CfgError> {
        Builder::new(method).build()
    }

    /// Block containing an instruction index, if the instruction survived
    /// unreachable-block pruning.
    pub fn block_of(&self, index: usize) -> Option<BlockId> {
        self.blocks.iter().position(|b| b.contains(index))
    }

    pub fn exits(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.exit.is_some())
            .map(|(id, _)| id)
    }

    /// Predecessor lists over both edge kinds.
    pub fn predecessors(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.blocks.len()];
        for (id, block) in self.blocks.iter().enumerate() {
            for &(succ, _) in &block.succs {
                preds[succ].push(id);
            }
        }
        preds
    }
}

struct Builder<'m> {
    method: &'m Method,
}

impl<'m> Builder<'m> {
    fn new(method: &'m Method) -> Self {
        Self { method }
    }

    fn build(self) -> Result<Cfg, CfgError> {
        let insns = &self.method.insns;
        let n = insns.len();

        self.validate()?;

        if n == 0 {
            // Empty body: the entry is also the sole (normal) exit.
            return Ok(Cfg {
                blocks: vec![BasicBlock {
                    start: 0,
                    end: 0,
                    succs: Vec::new(),
                    exit: Some(ExitKind::Return),
                }],
                entry: 0,
            });
        }

        let leaders = self.leaders();
        let bounds: Vec<usize> = leaders.iter().copied().collect();

        // Block 0 is the synthetic entry.
        let mut blocks = vec![BasicBlock {
            start: 0,
            end: 0,
            succs: vec![(1, EdgeKind::Normal)],
            exit: None,
        }];
        for (i, &start) in bounds.iter().enumerate() {
            let end = bounds.get(i + 1).copied().unwrap_or(n);
            blocks.push(BasicBlock {
                start,
                end,
                succs: Vec::new(),
                exit: None,
            });
        }

        let block_at = |index: usize| -> BlockId {
            // Leaders are sorted and every branch target is a leader, so the
            // count of leaders at or before the index is the block id (the
            // entry block occupies slot 0).
            bounds.partition_point(|&l| l <= index)
        };

        for id in 1..blocks.len() {
            let (start, end) = (blocks[id].start, blocks[id].end);
            let last = end - 1;
            let mut succs: Vec<(BlockId, EdgeKind)> = Vec::new();
            let mut exit = None;

            match &insns[last] {
                Insn::Goto { target } => {
                    succs.push((block_at(*target as usize), EdgeKind::Normal));
                }
                Insn::Branch { target } => {
                    succs.push((block_at(*target as usize), EdgeKind::Normal));
                    if end < n {
                        succs.push((block_at(end), EdgeKind::Normal));
                    } else {
                        return Err(CfgError::FallsOffEnd { index: last });
                    }
                }
                Insn::Return { .. } => exit = Some(ExitKind::Return),
                Insn::Throw { .. } => {
                    if !self.covered(last) {
                        exit = Some(ExitKind::UncaughtThrow);
                    }
                }
                _ => {
                    if end < n {
                        succs.push((block_at(end), EdgeKind::Normal));
                    } else {
                        return Err(CfgError::FallsOffEnd { index: last });
                    }
                }
            }

            // Try-range boundaries are leaders, so coverage is uniform across
            // the block: one exceptional edge per covering handler.
            for tr in &self.method.try_ranges {
                if (tr.start as usize) < end && start < tr.end as usize {
                    let edge = (block_at(tr.handler as usize), EdgeKind::Exceptional);
                    if !succs.contains(&edge) {
                        succs.push(edge);
                    }
                }
            }

            blocks[id].succs = succs;
            blocks[id].exit = exit;
        }

        Ok(prune_unreachable(blocks))
    }

    fn validate(&self) -> Result<(), CfgError> {
        let n = self.method.insns.len();
        for (index, insn) in self.method.insns.iter().enumerate() {
            if let Insn::Goto { target } | Insn::Branch { target } = insn
                && *target as usize >= n
            {
                return Err(CfgError::BranchOutOfRange {
                    index,
                    target: *target,
                });
            }
        }
        for tr in &self.method.try_ranges {
            if tr.start > tr.end || tr.end as usize > n {
                return Err(CfgError::MalformedTryRange {
                    start: tr.start,
                    end: tr.end,
                });
            }
            if tr.handler as usize >= n {
                return Err(CfgError::HandlerOutOfRange {
                    handler: tr.handler,
                });
            }
        }
        Ok(())
    }

    /// Block boundaries: the method start, every branch target, every
    /// instruction after a terminator, every handler entry, and both ends of
    /// every try range.
    fn leaders(&self) -> BTreeSet<usize> {
        let n = self.method.insns.len();
        let mut leaders = BTreeSet::from([0]);

        for (i, insn) in self.method.insns.iter().enumerate() {
            match insn {
                Insn::Goto { target } | Insn::Branch { target } => {
                    leaders.insert(*target as usize);
                    if i + 1 < n {
                        leaders.insert(i + 1);
                    }
                }
                Insn::Return { .. } | Insn::Throw { .. } => {
                    if i + 1 < n {
                        leaders.insert(i + 1);
                    }
                }
                _ => {}
            }
        }
        for tr in &self.method.try_ranges {
            leaders.insert(tr.start as usize);
            if (tr.end as usize) < n {
                leaders.insert(tr.end as usize);
            }
            leaders.insert(tr.handler as usize);
        }
        leaders
    }

    fn covered(&self, index: usize) -> bool {
        self.method
            .try_ranges
            .iter()
            .any(|tr| tr.start as usize <= index && index < tr.end as usize)
    }
}

fn prune_unreachable(blocks: Vec<BasicBlock>) -> Cfg {
    let mut reachable = vec![false; blocks.len()];
    let mut queue = VecDeque::from([0usize]);
    reachable[0] = true;
    while let Some(id) = queue.pop_front() {
        for &(succ, _) in &blocks[id].succs {
            if !reachable[succ] {
                reachable[succ] = true;
                queue.push_back(succ);
            }
        }
    }

    if reachable.iter().all(|&r| r) {
        return Cfg { blocks, entry: 0 };
    }

    let mut remap = vec![usize::MAX; blocks.len()];
    let mut kept = Vec::new();
    for (id, block) in blocks.into_iter().enumerate() {
        if reachable[id] {
            remap[id] = kept.len();
            kept.push(block);
        }
    }
    for block in &mut kept {
        for (succ, _) in &mut block.succs {
            *succ = remap[*succ];
        }
    }
    Cfg {
        blocks: kept,
        entry: 0,
    }
}
