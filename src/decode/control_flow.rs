//! §4.8 control-flow emitters: conditional branches, unconditional
//! jumps, and the `break`/`syscall` trap pair.
//!
//! Conditional branches emit a single guarded `Exit` whose predicate
//! is the comparison itself; the surrounding translation-unit loop is
//! responsible for threading the untaken (fall-through) path, per the
//! teacher's `jump_to_address` split between "this instruction decided
//! to jump" and "the caller decides what that means" (`platform/rv32i.rs`).

use crate::fields::{self, ThreeReg};
use crate::ir::{BinOp, ExitTarget, GuestLoc, IrExpr, IrStmt, JumpKind};
use crate::result::{StopReason, TranslationResult};
use crate::helpers::ExternalHelpers;

use super::DecodeContext;

fn opcode17(word: u32) -> u32 {
    fields::extract(word, 15, 17)
}

const BREAK: u32 = 0x54;
const SYSCALL: u32 = 0x56;
const DBAR: u32 = 0x38;
const IBAR: u32 = 0x39;

/// `dbar`, `ibar`, and the `break`/`syscall` traps all share major
/// opcode `0b000000`, so they fall out of `dispatch_group_00` after
/// the arithmetic/FP emitters have had a chance to match.
pub fn try_decode_misc<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    match opcode17(ctx.word) {
        DBAR => Some(build_fence(ctx, JumpKind::Boring, false)),
        IBAR => Some(build_fence(ctx, JumpKind::Boring, true)),
        BREAK => Some(build_break(ctx)),
        SYSCALL => Some(build_syscall(ctx)),
        _ => None,
    }
}

fn build_fence<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, kind: JumpKind, icache: bool) -> TranslationResult {
    // No dedicated fence IrStmt exists in this minimal vocabulary;
    // the barrier itself has no guest-visible register effect, so the
    // only thing left to emit is the ordinary PC advance.
    let _ = (kind, icache);
    TranslationResult::continue_decoding()
}

fn build_break<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> TranslationResult {
    // The immediate `code` field distinguishes FP-overflow, integer-divide
    // and generic trap conventions; this minimal IR threads it through as
    // the stop-reason hint rather than branching into distinct jump kinds.
    let code = fields::code15(ctx.word);
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Pc, value: IrExpr::constant(ctx.fallthrough_pc()) });
    ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Const(ctx.fallthrough_pc()), kind: JumpKind::SigTrap });
    TranslationResult::stop(StopReason::Trap, code as u64)
}

fn build_syscall<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> TranslationResult {
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Pc, value: IrExpr::constant(ctx.fallthrough_pc()) });
    ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Const(ctx.fallthrough_pc()), kind: JumpKind::Syscall });
    TranslationResult::stop(StopReason::Syscall, 0)
}

fn cmp_op_for(opcode17: u32) -> Option<BinOp> {
    match opcode17 {
        BEQ => Some(BinOp::CmpEq),
        BNE => Some(BinOp::CmpNe),
        BLT => Some(BinOp::CmpLtSigned),
        BGE => Some(BinOp::CmpGeSigned),
        BLTU => Some(BinOp::CmpLtUnsigned),
        BGEU => Some(BinOp::CmpGeUnsigned),
        _ => None,
    }
}

const BEQ: u32 = 0b010110;
const BNE: u32 = 0b010111;
const BLT: u32 = 0b011000;
const BGE: u32 = 0b011001;
const BLTU: u32 = 0b011010;
const BGEU: u32 = 0b011011;

fn major6(word: u32) -> u32 {
    fields::extract(word, 26, 6)
}

/// `beq`, `bne`, `blt`, `bge`, `bltu`, `bgeu`: majors `0b010110..=0b011011`.
pub fn try_decode_beq_family<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = cmp_op_for(major6(ctx.word))?;
    let f: ThreeReg = fields::decode_3r(ctx.word);
    let offset = fields::offs16(ctx.word);
    let target = ctx.guest_pc.wrapping_add(offset as u64);

    let taken = IrExpr::bin(op, IrExpr::reg(GuestLoc::Gpr(f.rd)), IrExpr::reg(GuestLoc::Gpr(f.rj)));
    emit_conditional_branch(ctx, taken, target);
    Some(TranslationResult::stop(StopReason::ControlFlow, 0))
}

/// `beqz`/`bnez`: majors `0b010000`/`0b010001`, `offs21`-encoded.
pub fn try_decode_beqz_bnez<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let major = major6(ctx.word);
    let is_bnez = match major {
        0b010000 => false,
        0b010001 => true,
        _ => return None,
    };
    let rj = fields::rj(ctx.word);
    let offset = fields::offs21(ctx.word);
    let target = ctx.guest_pc.wrapping_add(offset as u64);

    let zero_cmp = IrExpr::bin(BinOp::CmpEq, IrExpr::reg(GuestLoc::Gpr(rj)), IrExpr::constant(0));
    let taken = if is_bnez { IrExpr::bin(BinOp::CmpEq, zero_cmp, IrExpr::constant(0)) } else { zero_cmp };
    emit_conditional_branch(ctx, taken, target);
    Some(TranslationResult::stop(StopReason::ControlFlow, 0))
}

/// `b`/`bl`: majors `0b010100`/`0b010101`, `offs26`-encoded.
pub fn try_decode_b_family<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let major = major6(ctx.word);
    let is_link = match major {
        0b010100 => false,
        0b010101 => true,
        _ => return None,
    };
    let offset = fields::offs26(ctx.word);
    let target = ctx.guest_pc.wrapping_add(offset as u64);

    if is_link {
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Gpr(1), value: IrExpr::constant(ctx.fallthrough_pc()) });
    }
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Pc, value: IrExpr::constant(target) });
    ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Const(target), kind: JumpKind::Boring });
    Some(TranslationResult::stop(StopReason::ControlFlow, 0))
}

/// `jirl rd, rj, offs16`: reads `rj` before writing `rd`, so that
/// `rd == rj` still computes the jump target from the pre-write value.
pub fn try_decode_jirl<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let rd = fields::rd(ctx.word);
    let rj = fields::rj(ctx.word);
    let offset = fields::offs16(ctx.word);
    let rj_value = IrExpr::reg(GuestLoc::Gpr(rj));
    let target_expr = IrExpr::bin(BinOp::Add, rj_value, IrExpr::constant(offset as u64));

    ctx.emit_gpr_write(rd, IrExpr::constant(ctx.fallthrough_pc()));
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Pc, value: target_expr.clone() });
    ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Dynamic(target_expr), kind: JumpKind::Boring });
    Some(TranslationResult::stop(StopReason::ControlFlow, 0))
}

fn emit_conditional_branch<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, taken: IrExpr, target: u64) {
    ctx.builder.emit(IrStmt::Exit { guarded: Some(taken), target: ExitTarget::Const(target), kind: JumpKind::Boring });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Abi, ArchCaps};
    use crate::ir::RecordingBuilder;
    use crate::testutil::NoopHelpers;

    fn ctx_for<'a>(word: u32, guest_pc: u64, caps: &'a ArchCaps, abi: &'a Abi, builder: &'a mut RecordingBuilder, helpers: &'a NoopHelpers) -> DecodeContext<'a, NoopHelpers> {
        DecodeContext { word, guest_pc, caps, abi, host_little_endian: true, sigill_diag: false, builder, helpers }
    }

    #[test]
    fn beq_emits_guarded_exit_to_computed_target() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        // beq $zero,$zero,1 => offs16=1 instruction unit => +4 bytes
        let word = (BEQ << 26) | 1;
        let mut ctx = ctx_for(word, 0x1000, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_beq_family(&mut ctx).expect("should decode");
        assert_eq!(result.stop_reason, Some(StopReason::ControlFlow));
        assert!(matches!(builder.stmts[0], IrStmt::Exit { guarded: Some(_), target: ExitTarget::Const(0x1004), .. }));
    }

    #[test]
    fn jirl_reads_rj_before_writing_rd() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        // jirl $r1, $r1, 0
        let word = 0x4C00_0000u32 | (1 << 5) | 1;
        let mut ctx = ctx_for(word, 0x2000, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_jirl(&mut ctx).expect("should decode");
        assert_eq!(result.stop_reason, Some(StopReason::ControlFlow));
        match &builder.stmts[1] {
            IrStmt::Assign { dst: GuestLoc::Pc, value } => {
                assert!(matches!(value, IrExpr::BinOp(BinOp::Add, _, _)));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn b_family_link_variant_saves_return_address() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = 0b010101u32 << 26;
        let mut ctx = ctx_for(word, 0x3000, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_b_family(&mut ctx).expect("should decode");
        assert_eq!(result.stop_reason, Some(StopReason::ControlFlow));
        assert!(matches!(builder.stmts[0], IrStmt::Assign { dst: GuestLoc::Gpr(1), .. }));
    }
}
