//! §4.4 fixed-point arithmetic, logical and shift emitters.
//!
//! Follows `platform/rv32i.rs`'s shape: small shared helpers
//! (`reg_reg_values`/`reg_imm_values`-equivalents here are just the
//! `fields::decode_3r`/`decode_2ri12` structs) feeding a flat list of
//! per-opcode build functions, looked up by the raw opcode sub-field
//! rather than wrapped in a per-opcode `Instr` record — this crate's
//! dispatcher is a direct match cascade, not a runtime-built table, so
//! there is no need for the teacher's function-pointer indirection
//! (see `DESIGN.md`).

use crate::fields::{self, ThreeReg, TwoRegImm};
use crate::helpers::ExternalHelpers;
use crate::ir::{BinOp, GuestLoc, IrExpr, IrStmt, UnOp};
use crate::result::{StopReason, TranslationResult};

use super::DecodeContext;

fn opcode17(word: u32) -> u32 {
    fields::extract(word, 15, 17)
}

fn opcode10(word: u32) -> u32 {
    fields::extract(word, 22, 10)
}

fn opcode7(word: u32) -> u32 {
    fields::extract(word, 25, 7)
}

const ADD_W: u32 = 0x20;
const ADD_D: u32 = 0x21;
const SUB_W: u32 = 0x22;
const SUB_D: u32 = 0x23;
const SLT: u32 = 0x24;
const SLTU: u32 = 0x25;
const MASKEQZ: u32 = 0x26;
const MASKNEZ: u32 = 0x27;
const NOR: u32 = 0x28;
const AND: u32 = 0x29;
const OR: u32 = 0x2A;
const XOR: u32 = 0x2B;
const ORN: u32 = 0x2C;
const ANDN: u32 = 0x2D;
const SLL_W: u32 = 0x2E;
const SRL_W: u32 = 0x2F;
const SRA_W: u32 = 0x30;
const SLL_D: u32 = 0x31;
const SRL_D: u32 = 0x32;
const SRA_D: u32 = 0x33;
const ROTR_W: u32 = 0x36;
const ROTR_D: u32 = 0x37;
const MUL_W: u32 = 0x38;
const MULH_W: u32 = 0x39;
const MULH_WU: u32 = 0x3A;
const MUL_D: u32 = 0x3B;
const MULH_D: u32 = 0x3C;
const MULH_DU: u32 = 0x3D;
const DIV_W: u32 = 0x40;
const MOD_W: u32 = 0x41;
const DIV_WU: u32 = 0x42;
const MOD_WU: u32 = 0x43;
const DIV_D: u32 = 0x44;
const MOD_D: u32 = 0x45;
const DIV_DU: u32 = 0x46;
const MOD_DU: u32 = 0x47;
const SYSCALL: u32 = 0x56;
const BREAK: u32 = 0x54;

const CRC_W_B_W: u32 = 0x48;
const CRC_W_H_W: u32 = 0x49;
const CRC_W_W_W: u32 = 0x4A;
const CRC_W_D_W: u32 = 0x4B;
const CRCC_W_B_W: u32 = 0x4C;
const CRCC_W_H_W: u32 = 0x4D;
const CRCC_W_W_W: u32 = 0x4E;
const CRCC_W_D_W: u32 = 0x4F;

/// `alsl.{w,wu,d}`/`bytepick.w`: fixed opcode occupies bits [31:17],
/// `sa2` (bits [16:15]) is the variable shift/pick amount, so the
/// discriminant is `opcode17 >> 2`.
fn top15(word: u32) -> u32 {
    opcode17(word) >> 2
}

/// `bytepick.d`: fixed opcode occupies bits [31:18], `sa3` (bits
/// [17:15]) is the variable pick amount, so the discriminant is
/// `opcode17 >> 3`.
fn top14(word: u32) -> u32 {
    opcode17(word) >> 3
}

const ALSL_W_TOP15: u32 = 0x0401;
const ALSL_WU_TOP15: u32 = 0x0402;
const ALSL_D_TOP15: u32 = 0x0403;
const BYTEPICK_W_TOP15: u32 = 0x0404;
const BYTEPICK_D_TOP14: u32 = 0x0203;

const BSTRINS_W: u32 = 0x003;
const BSTRINS_D: u32 = 0x004;
const BSTRPICK_W: u32 = 0x005;
const BSTRPICK_D: u32 = 0x006;

const REVB_2H: u32 = 0x16B88;
const REVB_4H: u32 = 0x16B89;
const REVB_2W: u32 = 0x16B8A;
const REVB_D: u32 = 0x16B8B;
const REVH_2W: u32 = 0x16B8C;
const REVH_D: u32 = 0x16B8D;
const BITREV_4B: u32 = 0x16B8E;
const BITREV_8B: u32 = 0x16B8F;
const BITREV_W: u32 = 0x16B90;
const BITREV_D: u32 = 0x16B91;
const CPUCFG: u32 = 0x16B92;
const RDTIME_W: u32 = 0x16B93;
const RDTIMEH_W: u32 = 0x16B94;
const RDTIME_D: u32 = 0x16B95;

const SLLI_W: u32 = 0x81;
const SRLI_W: u32 = 0x89;
const SRAI_W: u32 = 0x91;
const SLLI_D: u32 = 0x41;
const SRLI_D: u32 = 0x44;
const SRAI_D: u32 = 0x47;

const EXT_W_H: u32 = 0x16BD8;
const EXT_W_B: u32 = 0x16BD9;
const CLO_W: u32 = 0x16B80;
const CLZ_W: u32 = 0x16B81;
const CTO_W: u32 = 0x16B82;
const CTZ_W: u32 = 0x16B83;
const CLO_D: u32 = 0x16B84;
const CLZ_D: u32 = 0x16B85;
const CTO_D: u32 = 0x16B86;
const CTZ_D: u32 = 0x16B87;

const SLTI: u32 = 0x08;
const SLTUI: u32 = 0x09;
const ADDI_W: u32 = 0x0A;
const ADDI_D: u32 = 0x0B;
const LU52I_D: u32 = 0x0C;
const ANDI: u32 = 0x0D;
const ORI: u32 = 0x0E;
const XORI: u32 = 0x0F;

const LU12I_W: u32 = 0x0A;
const LU32I_D: u32 = 0x0B;
const PCADDI: u32 = 0x0C;
const PCALAU12I: u32 = 0x0D;
const PCADDU12I: u32 = 0x0E;
const PCADDU18I: u32 = 0x0F;

/// 3-register arithmetic/logical/shift/mul/div instructions.
pub fn try_decode_3r<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = opcode17(ctx.word);
    let f = fields::decode_3r(ctx.word);

    let (bin, is64): (BinOp, bool) = match op {
        ADD_W => (BinOp::Add, false),
        ADD_D => (BinOp::Add, true),
        SUB_W => (BinOp::Sub, false),
        SUB_D => (BinOp::Sub, true),
        SLT => (BinOp::CmpLtSigned, true),
        SLTU => (BinOp::CmpLtUnsigned, true),
        NOR => (BinOp::Nor, true),
        AND => (BinOp::And, true),
        OR => (BinOp::Or, true),
        XOR => (BinOp::Xor, true),
        SLL_W => (BinOp::Shl, false),
        SRL_W => (BinOp::ShrUnsigned, false),
        SRA_W => (BinOp::ShrSigned, false),
        SLL_D => (BinOp::Shl, true),
        SRL_D => (BinOp::ShrUnsigned, true),
        SRA_D => (BinOp::ShrSigned, true),
        ROTR_W => (BinOp::Rotr, false),
        ROTR_D => (BinOp::Rotr, true),
        MUL_W => (BinOp::Mul, false),
        MUL_D => (BinOp::Mul, true),
        MULH_W => (BinOp::MulHighSigned, false),
        MULH_WU => (BinOp::MulHighUnsigned, false),
        MULH_D => (BinOp::MulHighSigned, true),
        MULH_DU => (BinOp::MulHighUnsigned, true),
        DIV_W => (BinOp::DivSigned, false),
        MOD_W => (BinOp::RemSigned, false),
        DIV_WU => (BinOp::DivUnsigned, false),
        MOD_WU => (BinOp::RemUnsigned, false),
        DIV_D => (BinOp::DivSigned, true),
        MOD_D => (BinOp::RemSigned, true),
        DIV_DU => (BinOp::DivUnsigned, true),
        MOD_DU => (BinOp::RemUnsigned, true),
        ANDN => return Some(build_andn(ctx, f)),
        ORN => return Some(build_orn(ctx, f)),
        MASKEQZ => return Some(build_maskeqz(ctx, f, true)),
        MASKNEZ => return Some(build_maskeqz(ctx, f, false)),
        CRC_W_B_W => return Some(build_crc(ctx, f, 1, false)),
        CRC_W_H_W => return Some(build_crc(ctx, f, 2, false)),
        CRC_W_W_W => return Some(build_crc(ctx, f, 4, false)),
        CRC_W_D_W => return Some(build_crc(ctx, f, 8, false)),
        CRCC_W_B_W => return Some(build_crc(ctx, f, 1, true)),
        CRCC_W_H_W => return Some(build_crc(ctx, f, 2, true)),
        CRCC_W_W_W => return Some(build_crc(ctx, f, 4, true)),
        CRCC_W_D_W => return Some(build_crc(ctx, f, 8, true)),
        _ => return None,
    };

    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let rk = IrExpr::reg(GuestLoc::Gpr(f.rk));
    let result = IrExpr::bin(bin, rj, rk);
    let result = if is64 { result } else { narrow_to_w(result) };
    ctx.emit_gpr_write(f.rd, result);
    Some(TranslationResult::continue_decoding())
}

fn narrow_to_w(value: IrExpr) -> IrExpr {
    IrExpr::un(UnOp::SignExtend32To64, IrExpr::un(UnOp::Truncate64To32, value))
}

fn build_andn<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: ThreeReg) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let not_rk = IrExpr::un(UnOp::Not, IrExpr::reg(GuestLoc::Gpr(f.rk)));
    ctx.emit_gpr_write(f.rd, IrExpr::bin(BinOp::And, rj, not_rk));
    TranslationResult::continue_decoding()
}

fn build_orn<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: ThreeReg) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let not_rk = IrExpr::un(UnOp::Not, IrExpr::reg(GuestLoc::Gpr(f.rk)));
    ctx.emit_gpr_write(f.rd, IrExpr::bin(BinOp::Or, rj, not_rk));
    TranslationResult::continue_decoding()
}

/// `maskeqz rd,rj,rk`: rd = (rk == 0) ? rj : 0 (and the inverse for
/// `masknez`). Modeled with a compare-to-zero then an And-based select
/// rather than a dedicated select opcode, to keep the IR vocabulary
/// small.
fn build_maskeqz<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: ThreeReg, eqz: bool) -> TranslationResult {
    let rk = IrExpr::reg(GuestLoc::Gpr(f.rk));
    let cmp_op = if eqz { BinOp::CmpEq } else { BinOp::CmpNe };
    let is_masked = IrExpr::bin(cmp_op, rk, IrExpr::constant(0));
    // mask = 0 - is_masked (all-ones when masked, all-zeros otherwise)
    let mask = IrExpr::bin(BinOp::Sub, IrExpr::constant(0), is_masked);
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    ctx.emit_gpr_write(f.rd, IrExpr::bin(BinOp::And, rj, mask));
    TranslationResult::continue_decoding()
}

/// `crc.w.{b,h,w,d}.w`/`crcc.w.{b,h,w,d}.w`: `rj` carries the new data,
/// `rk` the running CRC accumulator; `crcc` selects the non-reflected
/// (Castagnoli) polynomial, `crc` the reflected one.
fn build_crc<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: ThreeReg, width_bytes: u32, reflected: bool) -> TranslationResult {
    let data = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let old_crc = IrExpr::reg(GuestLoc::Gpr(f.rk));
    let value = IrExpr::ExternalCall {
        name: "crc_step",
        args: vec![old_crc, data, IrExpr::constant(width_bytes as u64), IrExpr::constant(reflected as u64)],
    };
    ctx.emit_gpr_write(f.rd, value);
    TranslationResult::continue_decoding()
}

/// Shift left, masking the shift amount to the low 6 bits first — this
/// crate only ever calls it with amounts in `1..=4` (`alsl`'s `sa2+1`),
/// but the guard keeps the helper safe if a future caller threads a
/// wider field through it.
fn safe_shl(value: IrExpr, amount: u32) -> IrExpr {
    IrExpr::bin(BinOp::Shl, value, IrExpr::constant((amount & 0x3F) as u64))
}

/// `alsl.{w,wu,d}`: `rd = (rj << (sa2+1)) + rk`. `bytepick.{w,d}`:
/// `rd` is built from the high bytes of `rk` and low bytes of `rj`,
/// split at a byte offset given by `sa2`/`sa3`.
pub fn try_decode_alsl_bytepick<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let f = fields::decode_3r(ctx.word);
    let t15 = top15(ctx.word);

    if matches!(t15, ALSL_W_TOP15 | ALSL_WU_TOP15 | ALSL_D_TOP15) {
        let sa2 = fields::sa2(ctx.word);
        let is64 = t15 == ALSL_D_TOP15;
        let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
        let rk = IrExpr::reg(GuestLoc::Gpr(f.rk));
        let shifted = safe_shl(rj, sa2 as u32 + 1);
        let sum = IrExpr::bin(BinOp::Add, shifted, rk);
        let result = if is64 { sum } else { narrow_to_w(sum) };
        ctx.emit_gpr_write(f.rd, result);
        return Some(TranslationResult::continue_decoding());
    }

    if t15 == BYTEPICK_W_TOP15 {
        let sa2 = fields::sa2(ctx.word) as u32;
        return Some(build_bytepick(ctx, f, sa2, false));
    }

    if top14(ctx.word) == BYTEPICK_D_TOP14 {
        let sa3 = fields::sa3(ctx.word) as u32;
        return Some(build_bytepick(ctx, f, sa3, true));
    }

    None
}

fn build_bytepick<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: ThreeReg, byte_offset: u32, double: bool) -> TranslationResult {
    let width_bytes = if double { 8 } else { 4 };
    let bit_offset = byte_offset * 8;
    let high_part = safe_shl(IrExpr::reg(GuestLoc::Gpr(f.rk)), (width_bytes * 8 - bit_offset).min(63));
    let low_part = IrExpr::bin(BinOp::ShrUnsigned, IrExpr::reg(GuestLoc::Gpr(f.rj)), IrExpr::constant(bit_offset as u64));
    let value = IrExpr::bin(BinOp::Or, high_part, low_part);
    let value = if double { value } else { narrow_to_w(value) };
    ctx.emit_gpr_write(f.rd, value);
    TranslationResult::continue_decoding()
}

/// `bstrins.{w,d}`/`bstrpick.{w,d}`: insert or extract a contiguous
/// bitfield `[msb:lsb]` between `rj` and `rd`.
pub fn try_decode_bstr<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = opcode10(ctx.word);
    match op {
        BSTRINS_W => Some(build_bstrins(ctx, false)),
        BSTRINS_D => Some(build_bstrins(ctx, true)),
        BSTRPICK_W => Some(build_bstrpick(ctx, false)),
        BSTRPICK_D => Some(build_bstrpick(ctx, true)),
        _ => None,
    }
}

fn build_bstrins<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, double: bool) -> TranslationResult {
    let (msb, lsb) = if double { fields::msbd_lsbd(ctx.word) } else { fields::msbw_lsbw(ctx.word) };
    let nbits = (msb - lsb + 1) as u32;
    let rd = fields::rd(ctx.word);
    let rj = fields::rj(ctx.word);
    let field_mask = fields::mask64(nbits);
    let src_bits = safe_shl(IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Gpr(rj)), IrExpr::constant(field_mask)), lsb as u32);
    let kept = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Gpr(rd)), IrExpr::constant(!(field_mask << lsb)));
    let value = IrExpr::bin(BinOp::Or, kept, src_bits);
    let value = if double { value } else { narrow_to_w(value) };
    ctx.emit_gpr_write(rd, value);
    TranslationResult::continue_decoding()
}

fn build_bstrpick<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, double: bool) -> TranslationResult {
    let (msb, lsb) = if double { fields::msbd_lsbd(ctx.word) } else { fields::msbw_lsbw(ctx.word) };
    let nbits = (msb - lsb + 1) as u32;
    let rd = fields::rd(ctx.word);
    let rj = fields::rj(ctx.word);
    let shifted = IrExpr::bin(BinOp::ShrUnsigned, IrExpr::reg(GuestLoc::Gpr(rj)), IrExpr::constant(lsb as u64));
    let value = IrExpr::bin(BinOp::And, shifted, IrExpr::constant(fields::mask64(nbits)));
    let value = if double { value } else { narrow_to_w(value) };
    ctx.emit_gpr_write(rd, value);
    TranslationResult::continue_decoding()
}

/// 2-register instructions: sign/zero extension and bit-counting.
pub fn try_decode_2r<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = fields::extract(ctx.word, 10, 22);
    let f = fields::decode_2r(ctx.word);
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));

    let value = match op {
        EXT_W_H => IrExpr::un(UnOp::SignExtend32To64, IrExpr::un(UnOp::Truncate64To32, IrExpr::bin(BinOp::And, rj, IrExpr::constant(0xFFFF)))),
        EXT_W_B => IrExpr::un(UnOp::SignExtend32To64, IrExpr::un(UnOp::Truncate64To32, IrExpr::bin(BinOp::And, rj, IrExpr::constant(0xFF)))),
        CLO_W | CLZ_W | CTO_W | CTZ_W | CLO_D | CLZ_D | CTO_D | CTZ_D => {
            IrExpr::ExternalCall { name: bitcount_helper_name(op), args: vec![rj] }
        }
        REVB_2H => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(2)] },
        REVB_4H => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(2)] },
        REVB_2W => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(4)] },
        REVB_D => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(8)] },
        REVH_2W => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(4)] },
        REVH_D => IrExpr::ExternalCall { name: "reverse_bytes", args: vec![rj, IrExpr::constant(8)] },
        BITREV_4B => IrExpr::ExternalCall { name: "reverse_bits", args: vec![rj, IrExpr::constant(4)] },
        BITREV_8B => IrExpr::ExternalCall { name: "reverse_bits", args: vec![rj, IrExpr::constant(8)] },
        BITREV_W => IrExpr::ExternalCall { name: "reverse_bits", args: vec![rj, IrExpr::constant(4)] },
        BITREV_D => IrExpr::ExternalCall { name: "reverse_bits", args: vec![rj, IrExpr::constant(8)] },
        CPUCFG => {
            if !ctx.caps.cpucfg {
                return Some(illegal_2r(ctx));
            }
            IrExpr::ExternalCall { name: "cpucfg", args: vec![rj] }
        }
        RDTIME_W | RDTIMEH_W | RDTIME_D => {
            // Per spec: this crate has no host timer to read, so the
            // counter value is a constant zero; the paired time-ID
            // register (`rj`) receives the same, matching the other
            // two destination-writing forms.
            ctx.emit_gpr_write(f.rj, IrExpr::constant(0));
            IrExpr::constant(0)
        }
        _ => return None,
    };

    ctx.emit_gpr_write(f.rd, value);
    Some(TranslationResult::continue_decoding())
}

fn illegal_2r<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> TranslationResult {
    ctx.builder.emit(IrStmt::Exit {
        guarded: None,
        target: crate::ir::ExitTarget::Const(ctx.guest_pc),
        kind: crate::ir::JumpKind::SigIll,
    });
    TranslationResult::stop(StopReason::IllegalInstruction, 0)
}

fn bitcount_helper_name(op: u32) -> &'static str {
    match op {
        CLO_W => "clo_w",
        CLZ_W => "clz_w",
        CTO_W => "cto_w",
        CTZ_W => "ctz_w",
        CLO_D => "clo_d",
        CLZ_D => "clz_d",
        CTO_D => "cto_d",
        _ => "ctz_d",
    }
}

/// Shift-by-immediate instructions (`slli.{w,d}`, `srli.{w,d}`, `srai.{w,d}`).
pub fn try_decode_shift_imm<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op17 = opcode17(ctx.word);
    let (bin, is64, width) = match op17 {
        SLLI_W => (BinOp::Shl, false, fields::decode_shift_w(ctx.word)),
        SRLI_W => (BinOp::ShrUnsigned, false, fields::decode_shift_w(ctx.word)),
        SRAI_W => (BinOp::ShrSigned, false, fields::decode_shift_w(ctx.word)),
        _ => {
            let op16 = fields::extract(ctx.word, 16, 16);
            match op16 {
                SLLI_D => (BinOp::Shl, true, fields::decode_shift_d(ctx.word)),
                SRLI_D => (BinOp::ShrUnsigned, true, fields::decode_shift_d(ctx.word)),
                SRAI_D => (BinOp::ShrSigned, true, fields::decode_shift_d(ctx.word)),
                _ => return None,
            }
        }
    };

    let rj = IrExpr::reg(GuestLoc::Gpr(width.rj));
    let amount = IrExpr::constant(width.shamt as u64);
    let result = IrExpr::bin(bin, rj, amount);
    let result = if is64 { result } else { narrow_to_w(result) };
    ctx.emit_gpr_write(width.rd, result);
    Some(TranslationResult::continue_decoding())
}

/// `syscall`/`break`: both carry a 15-bit immediate `code` that is
/// opaque to this crate; they unconditionally stop the unit.
pub fn try_decode_trap<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = opcode17(ctx.word);
    let code = fields::code15(ctx.word) as u64;
    match op {
        SYSCALL => {
            ctx.builder.emit(IrStmt::Exit {
                guarded: None,
                target: crate::ir::ExitTarget::Const(ctx.fallthrough_pc()),
                kind: crate::ir::JumpKind::Syscall,
            });
            Some(TranslationResult::stop(StopReason::Syscall, code))
        }
        BREAK => {
            ctx.builder.emit(IrStmt::Exit {
                guarded: None,
                target: crate::ir::ExitTarget::Const(ctx.fallthrough_pc()),
                kind: crate::ir::JumpKind::SigTrap,
            });
            Some(TranslationResult::stop(StopReason::Trap, code))
        }
        _ => None,
    }
}

/// 2-register-plus-12-bit-immediate instructions; shares major
/// `0b000000` with the 3R/2R/shift family (its own 10-bit opcode
/// sub-field already narrows the top 6 bits to zero).
pub fn try_decode_2ri12<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = opcode10(ctx.word);
    match op {
        ADDI_W => Some(build_addi(ctx, fields::decode_2ri12(ctx.word), false)),
        ADDI_D => Some(build_addi(ctx, fields::decode_2ri12(ctx.word), true)),
        SLTI => Some(build_slti(ctx, fields::decode_2ri12(ctx.word), BinOp::CmpLtSigned)),
        SLTUI => Some(build_slti(ctx, fields::decode_2ri12(ctx.word), BinOp::CmpLtUnsigned)),
        ANDI => Some(build_logic_imm(ctx, fields::decode_2ri12_unsigned(ctx.word), BinOp::And)),
        ORI => Some(build_logic_imm(ctx, fields::decode_2ri12_unsigned(ctx.word), BinOp::Or)),
        XORI => Some(build_logic_imm(ctx, fields::decode_2ri12_unsigned(ctx.word), BinOp::Xor)),
        LU52I_D => Some(build_lu52i_d(ctx, fields::decode_2ri12(ctx.word))),
        _ => None,
    }
}

fn build_addi<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: TwoRegImm, is64: bool) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let imm = IrExpr::constant(f.imm as u64);
    let result = IrExpr::bin(BinOp::Add, rj, imm);
    let result = if is64 { result } else { narrow_to_w(result) };
    ctx.emit_gpr_write(f.rd, result);
    TranslationResult::continue_decoding()
}

fn build_slti<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: TwoRegImm, op: BinOp) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let imm = IrExpr::constant(f.imm as u64);
    ctx.emit_gpr_write(f.rd, IrExpr::bin(op, rj, imm));
    TranslationResult::continue_decoding()
}

fn build_logic_imm<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: TwoRegImm, op: BinOp) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let imm = IrExpr::constant(f.imm as u64);
    ctx.emit_gpr_write(f.rd, IrExpr::bin(op, rj, imm));
    TranslationResult::continue_decoding()
}

fn build_lu52i_d<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, f: TwoRegImm) -> TranslationResult {
    let rj = IrExpr::reg(GuestLoc::Gpr(f.rj));
    let low52 = IrExpr::bin(BinOp::And, rj, IrExpr::constant(fields::mask64(52)));
    let high12 = IrExpr::constant(((f.imm as u64) & fields::mask64(12)) << 52);
    ctx.emit_gpr_write(f.rd, IrExpr::bin(BinOp::Or, low52, high12));
    TranslationResult::continue_decoding()
}

/// 1-register-plus-20-bit-immediate instructions, majors `0b000101..=0b000111`.
pub fn try_decode_1ri20<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = opcode7(ctx.word);
    let rd = fields::rd(ctx.word);
    let imm = fields::si20(ctx.word);

    let value = match op {
        LU12I_W => narrow_to_w(IrExpr::constant(((imm as u64) & fields::mask64(20)) << 12)),
        LU32I_D => {
            let rd_expr = IrExpr::reg(GuestLoc::Gpr(rd));
            let low32 = IrExpr::bin(BinOp::And, rd_expr, IrExpr::constant(fields::mask64(32)));
            let high = IrExpr::constant(((imm as u64) & fields::mask64(20)) << 32);
            IrExpr::bin(BinOp::Or, low32, high)
        }
        PCADDI => IrExpr::constant((ctx.guest_pc as i64).wrapping_add(imm << 2) as u64),
        PCALAU12I => IrExpr::constant(((ctx.guest_pc as i64 & !0xFFF).wrapping_add(imm << 12)) as u64),
        PCADDU12I => IrExpr::constant((ctx.guest_pc as i64).wrapping_add(imm << 12) as u64),
        PCADDU18I => IrExpr::constant((ctx.guest_pc as i64).wrapping_add(imm << 18) as u64),
        _ => return None,
    };

    ctx.emit_gpr_write(rd, value);
    Some(TranslationResult::continue_decoding())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Abi, ArchCaps};
    use crate::ir::RecordingBuilder;
    use crate::testutil::NoopHelpers;

    fn ctx_for<'a>(word: u32, caps: &'a ArchCaps, abi: &'a Abi, builder: &'a mut RecordingBuilder, helpers: &'a NoopHelpers) -> DecodeContext<'a, NoopHelpers> {
        DecodeContext { word, guest_pc: 0x1000, caps, abi, host_little_endian: true, sigill_diag: false, builder, helpers }
    }

    #[test]
    fn add_w_emits_narrowing_add() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = 0x0010_0000 | (1 << 10) | (2 << 5) | 3; // add.w $r3, $r2, $r1
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_3r(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
        assert_eq!(builder.stmts.len(), 1);
    }

    #[test]
    fn addi_w_reads_si12() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        // addi.w $r1, $r0, -1
        let word = (ADDI_W << 22) | (0xFFF << 10) | (0 << 5) | 1;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_2ri12(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
    }

    #[test]
    fn unknown_3r_opcode_returns_none() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let mut ctx = ctx_for(0, &caps, &abi, &mut builder, &helpers);
        assert!(try_decode_3r(&mut ctx).is_none());
    }

    #[test]
    fn alsl_w_shifts_then_adds() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let op17 = (ALSL_W_TOP15 << 2) | 0; // sa2 = 0 => shift by 1
        let word = (op17 << 15) | (2 << 10) | (1 << 5) | 3;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_alsl_bytepick(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
        assert_eq!(builder.stmts.len(), 1);
    }

    #[test]
    fn bytepick_d_picks_byte_offset_from_sa3() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let op17 = (BYTEPICK_D_TOP14 << 3) | 2; // sa3 = 2
        let word = (op17 << 15) | (2 << 10) | (1 << 5) | 3;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_alsl_bytepick(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
    }

    #[test]
    fn bstrins_w_merges_field_into_destination() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (BSTRINS_W << 22) | (7 << 16) | (2 << 10) | (2 << 5) | 1;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_bstr(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
        assert!(matches!(builder.stmts[0], IrStmt::Assign { dst: GuestLoc::Gpr(1), .. }));
    }

    #[test]
    fn bstrpick_d_extracts_field() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (BSTRPICK_D << 22) | (10 << 16) | (3 << 10) | (2 << 5) | 1;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_bstr(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
    }

    #[test]
    fn crc_w_b_w_calls_crc_step_helper() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (CRC_W_B_W << 15) | (2 << 10) | (1 << 5) | 3;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_3r(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
        assert_eq!(builder.stmts.len(), 1);
    }

    #[test]
    fn revb_2h_calls_reverse_bytes_helper() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (REVB_2H << 10) | (1 << 5) | 2;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_2r(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
    }

    #[test]
    fn cpucfg_requires_capability() {
        let caps = ArchCaps::default();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (CPUCFG << 10) | (1 << 5) | 2;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_2r(&mut ctx).expect("should decode");
        assert_eq!(result.stop_reason, Some(StopReason::IllegalInstruction));
    }

    #[test]
    fn rdtime_w_writes_destination_and_time_id_as_zero() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let word = (RDTIME_W << 10) | (1 << 5) | 2;
        let mut ctx = ctx_for(word, &caps, &abi, &mut builder, &helpers);
        let result = try_decode_2r(&mut ctx).expect("should decode");
        assert_eq!(result.length, 4);
        assert_eq!(builder.stmts.len(), 2);
    }
}
