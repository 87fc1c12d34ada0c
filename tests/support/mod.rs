//! Shared builders for constructing class-model fixtures in tests.

#![allow(dead_code)]

use classlint::diagnostics::Diagnostic;
use classlint::model::{BinOp, ClassModel, Insn, LineEntry, Method, MethodSig, Reg, TryRange};

pub const WAKE_LOCK: &str = "android/os/PowerManager$WakeLock";
pub const SECURE_RANDOM: &str = "java/security/SecureRandom";
pub const SYSTEM: &str = "java/lang/System";

pub fn invoke(
    owner: &str,
    name: &str,
    receiver: Option<Reg>,
    args: Vec<Reg>,
    dst: Option<Reg>,
) -> Insn {
    Insn::Invoke {
        sig: MethodSig::new(owner, name),
        receiver,
        args,
        dst,
    }
}

pub struct MethodBuilder {
    name: String,
    insns: Vec<Insn>,
    try_ranges: Vec<TryRange>,
    lines: Vec<LineEntry>,
}

impl MethodBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            insns: Vec::new(),
            try_ranges: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Map the next pushed instruction (and everything after it, until the
    /// next marker) to this source line.
    pub fn at_line(mut self, line: u32) -> Self {
        self.lines.push(LineEntry {
            index: self.insns.len() as u32,
            line,
        });
        self
    }

    pub fn push(mut self, insn: Insn) -> Self {
        self.insns.push(insn);
        self
    }

    pub fn try_range(mut self, start: u32, end: u32, handler: u32) -> Self {
        self.try_ranges.push(TryRange {
            start,
            end,
            handler,
        });
        self
    }

    pub fn acquire(self, receiver: Reg) -> Self {
        self.push(invoke(WAKE_LOCK, "acquire", Some(receiver), vec![], None))
    }

    pub fn release(self, receiver: Reg) -> Self {
        self.push(invoke(WAKE_LOCK, "release", Some(receiver), vec![], None))
    }

    pub fn call(self, owner: &str, name: &str) -> Self {
        self.push(invoke(owner, name, None, vec![], None))
    }

    pub fn konst(self, dst: Reg, value: i64) -> Self {
        self.push(Insn::Const { dst, value })
    }

    pub fn binary(self, op: BinOp, dst: Reg, lhs: Reg, rhs: Reg) -> Self {
        self.push(Insn::Binary { op, dst, lhs, rhs })
    }

    pub fn goto(self, target: u32) -> Self {
        self.push(Insn::Goto { target })
    }

    pub fn branch(self, target: u32) -> Self {
        self.push(Insn::Branch { target })
    }

    pub fn ret(self) -> Self {
        self.push(Insn::Return { value: None })
    }

    pub fn throw(self, reg: Reg) -> Self {
        self.push(Insn::Throw { reg })
    }

    pub fn build(self) -> Method {
        Method {
            name: self.name,
            insns: self.insns,
            try_ranges: self.try_ranges,
            lines: self.lines,
        }
    }
}

pub fn class(name: &str, source_file: &str, methods: Vec<Method>) -> ClassModel {
    ClassModel {
        name: name.to_string(),
        source_file: source_file.to_string(),
        methods,
    }
}

/// Scan one class with the default engine and return its diagnostics.
pub fn scan(class: &ClassModel) -> Vec<Diagnostic> {
    classlint::create_default_engine().scan_class(class).diagnostics
}
