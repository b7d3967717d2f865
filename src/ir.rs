//! The opaque IR-builder collaborator.
//!
//! The real translator's IR type is out of scope (spec §1 Non-goals);
//! this module gives that collaborator a shape — a trait plus a small
//! set of expression/statement kinds — so the rest of the crate has
//! something concrete to emit into, and so tests can assert on the
//! resulting sequence the way the teacher's `printer` functions let a
//! test assert on a disassembly string (`platform/rv32i.rs`).

use crate::guest_state::Width;

/// Addressable pieces of guest state an `Assign`/`Store` can target or
/// a `Load`/`Reg` can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestLoc {
    Gpr(u8),
    Pc,
    Fpr(u8),
    Fcc(u8),
    Fcsr0,
    LlscAddr,
    LlscSize,
    LlscData,
    NextRedirect,
}

pub type TempId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    SignExtend32To64,
    ZeroExtend32To64,
    Truncate64To32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    MulHighSigned,
    MulHighUnsigned,
    DivSigned,
    DivUnsigned,
    RemSigned,
    RemUnsigned,
    And,
    Or,
    Xor,
    Nor,
    Shl,
    ShrSigned,
    ShrUnsigned,
    Rotr,
    CmpEq,
    CmpNe,
    CmpLtSigned,
    CmpLtUnsigned,
    CmpGeSigned,
    CmpGeUnsigned,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

#[derive(Debug, Clone)]
pub enum IrExpr {
    ConstU64(u64),
    Reg(GuestLoc),
    Temp(TempId),
    UnOp(UnOp, Box<IrExpr>),
    BinOp(BinOp, Box<IrExpr>, Box<IrExpr>),
    Load { addr: Box<IrExpr>, width: Width, signed: bool },
    /// Call into the host-supplied `ExternalHelpers` collaborator;
    /// `name` identifies which helper method, opaque to the IR layer.
    ExternalCall { name: &'static str, args: Vec<IrExpr> },
}

impl IrExpr {
    pub fn reg(loc: GuestLoc) -> Self {
        IrExpr::Reg(loc)
    }

    pub fn constant(value: u64) -> Self {
        IrExpr::ConstU64(value)
    }

    pub fn bin(op: BinOp, lhs: IrExpr, rhs: IrExpr) -> Self {
        IrExpr::BinOp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn un(op: UnOp, value: IrExpr) -> Self {
        IrExpr::UnOp(op, Box::new(value))
    }
}

/// Where an `Exit` statement sends control.
#[derive(Debug, Clone)]
pub enum ExitTarget {
    /// A statically known guest address (direct branch/jump).
    Const(u64),
    /// An address computed at runtime (register-indirect jump).
    Dynamic(IrExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Boring,
    Call,
    Return,
    Syscall,
    SigIll,
    SigBus,
    SigTrap,
    SigSys,
    ClientRequest,
    NoRedir,
}

#[derive(Debug, Clone)]
pub enum IrStmt {
    Assign { dst: GuestLoc, value: IrExpr },
    AssignTemp { dst: TempId, value: IrExpr },
    Store { addr: IrExpr, value: IrExpr, width: Width },
    /// Unconditional exit; `guarded` carries an optional predicate for
    /// a guarded ("if cond then exit") style statement.
    Exit { guarded: Option<IrExpr>, target: ExitTarget, kind: JumpKind },
    /// Placeholder for the IR-injection special-preamble marker.
    Inject { payload: u64 },
    /// Invalidate the icache line containing `payload` bytes starting
    /// at the current guest PC (special-preamble marker).
    InvalidateIcacheLine { payload: u64 },
}

/// The collaborator this crate emits into.
pub trait IrBuilder {
    fn new_temp(&mut self) -> TempId;
    fn emit(&mut self, stmt: IrStmt);
}

/// A concrete `IrBuilder` that just records every statement, used by
/// this crate's own tests the way the teacher's tests call `printer`
/// to get a disassembly string to assert against.
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    pub stmts: Vec<IrStmt>,
    next_temp: TempId,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IrBuilder for RecordingBuilder {
    fn new_temp(&mut self) -> TempId {
        let id = self.next_temp;
        self.next_temp += 1;
        id
    }

    fn emit(&mut self, stmt: IrStmt) {
        self.stmts.push(stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_builder_records_in_order() {
        let mut b = RecordingBuilder::new();
        b.emit(IrStmt::Assign { dst: GuestLoc::Gpr(1), value: IrExpr::constant(1) });
        b.emit(IrStmt::Assign { dst: GuestLoc::Gpr(2), value: IrExpr::constant(2) });
        assert_eq!(b.stmts.len(), 2);
    }

    #[test]
    fn temp_ids_are_unique_and_increasing() {
        let mut b = RecordingBuilder::new();
        let t0 = b.new_temp();
        let t1 = b.new_temp();
        assert!(t1 > t0);
    }
}
