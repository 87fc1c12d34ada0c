//! Instruction-level model of a compiled class.
//!
//! A [`ClassModel`] is the unit handed over by the project loader: every
//! method body arrives as a linear stream of register-machine instructions
//! plus an exception table and a source-line mapping table. The model is
//! immutable once loaded; the CFG builder and the detectors only read it.

use serde::{Deserialize, Serialize};

/// Virtual register index within one method body.
pub type Reg = u16;

/// Identity of an invoked method: internal owner name plus method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    /// Internal class name, e.g. `java/security/SecureRandom`.
    pub owner: String,
    /// Method name; constructors use the conventional `<init>`.
    pub name: String,
}

impl MethodSig {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Binary operator kinds carried by [`Insn::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    /// Fold two known operands. Wrapping semantics, division by zero folds
    /// to zero so provenance classification never panics on corpus data.
    pub fn fold(self, a: i64, b: i64) -> i64 {
        match self {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_div(b)
                }
            }
            BinOp::Rem => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_rem(b)
                }
            }
            BinOp::And => a & b,
            BinOp::Or => a | b,
            BinOp::Xor => a ^ b,
            BinOp::Shl => a.wrapping_shl(b as u32),
            BinOp::Shr => a.wrapping_shr(b as u32),
        }
    }
}

/// One bytecode-level instruction.
///
/// The set is deliberately small: it covers exactly the definition/use shapes
/// the detectors reason about. Anything a real class file does beyond this is
/// expected to be lowered (or dropped) by the external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insn {
    /// Load an integer/long literal into `dst`.
    Const { dst: Reg, value: i64 },
    /// Register-to-register copy.
    Move { dst: Reg, src: Reg },
    /// Read an instance or static field into `dst`.
    GetField {
        dst: Reg,
        owner: String,
        field: String,
    },
    /// Write `src` into a field.
    PutField {
        owner: String,
        field: String,
        src: Reg,
    },
    /// Allocate a fresh array of the given length into `dst`.
    NewArray { dst: Reg, length: u32 },
    /// Store `value` into `array[index]`.
    ArrayPut { array: Reg, index: Reg, value: Reg },
    /// Binary arithmetic/logic on two registers.
    Binary {
        op: BinOp,
        dst: Reg,
        lhs: Reg,
        rhs: Reg,
    },
    /// Method invocation. `receiver` is absent for static calls, `dst` for
    /// void results.
    Invoke {
        sig: MethodSig,
        receiver: Option<Reg>,
        #[serde(default)]
        args: Vec<Reg>,
        dst: Option<Reg>,
    },
    /// Unconditional jump to an instruction index.
    Goto { target: u32 },
    /// Conditional jump: taken edge to `target`, otherwise falls through.
    /// The predicate itself is irrelevant to every analysis here.
    Branch { target: u32 },
    /// Normal method exit.
    Return { value: Option<Reg> },
    /// Abrupt exit unless a try range covers this index.
    Throw { reg: Reg },
}

impl Insn {
    /// Register written by this instruction, if any.
    pub fn def(&self) -> Option<Reg> {
        match self {
            Insn::Const { dst, .. }
            | Insn::Move { dst, .. }
            | Insn::GetField { dst, .. }
            | Insn::NewArray { dst, .. }
            | Insn::Binary { dst, .. } => Some(*dst),
            Insn::Invoke { dst, .. } => *dst,
            _ => None,
        }
    }

    /// True when this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Insn::Goto { .. } | Insn::Branch { .. } | Insn::Return { .. } | Insn::Throw { .. }
        )
    }
}

/// Exception-table entry: instructions in `[start, end)` are covered by the
/// handler beginning at `handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryRange {
    pub start: u32,
    pub end: u32,
    pub handler: u32,
}

/// Source-line mapping entry: instruction `index` and everything after it
/// (up to the next entry) maps to `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEntry {
    pub index: u32,
    pub line: u32,
}

/// One compiled method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub insns: Vec<Insn>,
    #[serde(default)]
    pub try_ranges: Vec<TryRange>,
    #[serde(default)]
    pub lines: Vec<LineEntry>,
}

impl Method {
    /// Source line for an instruction index, per the line mapping table.
    /// Returns 0 when the table has no entry at or before the index.
    pub fn line_at(&self, index: usize) -> u32 {
        self.lines
            .iter()
            .filter(|e| e.index as usize <= index)
            .max_by_key(|e| e.index)
            .map(|e| e.line)
            .unwrap_or(0)
    }
}

/// One analyzed class: a name, the source file diagnostics anchor to, and
/// the method bodies the loader extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    pub name: String,
    pub source_file: String,
    #[serde(default)]
    pub methods: Vec<Method>,
}
