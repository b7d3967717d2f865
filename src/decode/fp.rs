//! §4.7 floating point emitters: arithmetic, fused multiply-add,
//! conversions, moves between GPR/FPR/FCC/FCSR, and the FCC-producing
//! compare family.
//!
//! Every emitter here checks `ctx.caps.fp` first and degrades to an
//! illegal-instruction exit when the capability is missing, per §3/§6.

use crate::fcsr::{self, FcsrView};
use crate::fields;
use crate::helpers::{ExternalHelpers, FpOp};
use crate::ir::{BinOp, ExitTarget, GuestLoc, IrExpr, IrStmt, JumpKind};
use crate::result::{StopReason, TranslationResult};

use super::DecodeContext;

fn illegal<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> TranslationResult {
    ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Const(ctx.guest_pc), kind: JumpKind::SigIll });
    TranslationResult::stop(StopReason::IllegalInstruction, 0)
}

fn require_fp<H: ExternalHelpers>(ctx: &DecodeContext<'_, H>) -> bool {
    ctx.caps.fp
}

fn opcode17(word: u32) -> u32 {
    fields::extract(word, 15, 17)
}

const FADD_S: u32 = 0x201;
const FADD_D: u32 = 0x202;
const FSUB_S: u32 = 0x205;
const FSUB_D: u32 = 0x206;
const FMUL_S: u32 = 0x209;
const FMUL_D: u32 = 0x20A;
const FDIV_S: u32 = 0x20D;
const FDIV_D: u32 = 0x20E;
const FMAX_S: u32 = 0x211;
const FMAX_D: u32 = 0x212;
const FMIN_S: u32 = 0x215;
const FMIN_D: u32 = 0x216;
const FMAXA_S: u32 = 0x219;
const FMAXA_D: u32 = 0x21A;
const FMINA_S: u32 = 0x21D;
const FMINA_D: u32 = 0x21E;
const FSCALEB_S: u32 = 0x221;
const FSCALEB_D: u32 = 0x222;
const FCOPYSIGN_S: u32 = 0x225;
const FCOPYSIGN_D: u32 = 0x226;

const FABS_S: u32 = 0x4501;
const FABS_D: u32 = 0x4502;
const FNEG_S: u32 = 0x4505;
const FNEG_D: u32 = 0x4506;
const FLOGB_S: u32 = 0x4509;
const FLOGB_D: u32 = 0x450A;
const FSQRT_S: u32 = 0x4511;
const FSQRT_D: u32 = 0x4512;
const FRECIP_S: u32 = 0x4515;
const FRECIP_D: u32 = 0x4516;
const FRSQRT_S: u32 = 0x4519;
const FRSQRT_D: u32 = 0x451A;
const FCLASS_S: u32 = 0x4531;
const FCLASS_D: u32 = 0x4532;
const FCVT_S_D: u32 = 0x4646;
const FCVT_D_S: u32 = 0x4649;

const FTINTRM_W_S: u32 = 0x4681;
const FTINTRM_W_D: u32 = 0x4682;
const FTINTRM_L_S: u32 = 0x4689;
const FTINTRM_L_D: u32 = 0x468A;
const FTINTRP_W_S: u32 = 0x4691;
const FTINTRP_W_D: u32 = 0x4692;
const FTINTRP_L_S: u32 = 0x4699;
const FTINTRP_L_D: u32 = 0x469A;
const FTINTRZ_W_S: u32 = 0x46A1;
const FTINTRZ_W_D: u32 = 0x46A2;
const FTINTRZ_L_S: u32 = 0x46A9;
const FTINTRZ_L_D: u32 = 0x46AA;
const FTINTRNE_W_S: u32 = 0x46B1;
const FTINTRNE_W_D: u32 = 0x46B2;
const FTINTRNE_L_S: u32 = 0x46B9;
const FTINTRNE_L_D: u32 = 0x46BA;
const FTINT_W_S: u32 = 0x46C1;
const FTINT_W_D: u32 = 0x46C2;
const FTINT_L_S: u32 = 0x46C9;
const FTINT_L_D: u32 = 0x46CA;

const FFINT_S_W: u32 = 0x4710;
const FFINT_S_L: u32 = 0x4712;
const FFINT_D_W: u32 = 0x4714;
const FFINT_D_L: u32 = 0x4716;

/// Rounding direction for the `ftint*` family; `Dynamic` reads the
/// current FCSR rounding-mode bits rather than forcing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TintRound {
    TowardZero,
    TowardPosInf,
    TowardNegInf,
    Nearest,
    Dynamic,
}

fn ftint_lookup(op17: u32) -> Option<(TintRound, bool, bool)> {
    // (rounding, dst_is_64_bit, src_is_double)
    match op17 {
        FTINTRZ_W_S => Some((TintRound::TowardZero, false, false)),
        FTINTRZ_W_D => Some((TintRound::TowardZero, false, true)),
        FTINTRZ_L_S => Some((TintRound::TowardZero, true, false)),
        FTINTRZ_L_D => Some((TintRound::TowardZero, true, true)),
        FTINTRP_W_S => Some((TintRound::TowardPosInf, false, false)),
        FTINTRP_W_D => Some((TintRound::TowardPosInf, false, true)),
        FTINTRP_L_S => Some((TintRound::TowardPosInf, true, false)),
        FTINTRP_L_D => Some((TintRound::TowardPosInf, true, true)),
        FTINTRM_W_S => Some((TintRound::TowardNegInf, false, false)),
        FTINTRM_W_D => Some((TintRound::TowardNegInf, false, true)),
        FTINTRM_L_S => Some((TintRound::TowardNegInf, true, false)),
        FTINTRM_L_D => Some((TintRound::TowardNegInf, true, true)),
        FTINTRNE_W_S => Some((TintRound::Nearest, false, false)),
        FTINTRNE_W_D => Some((TintRound::Nearest, false, true)),
        FTINTRNE_L_S => Some((TintRound::Nearest, true, false)),
        FTINTRNE_L_D => Some((TintRound::Nearest, true, true)),
        FTINT_W_S => Some((TintRound::Dynamic, false, false)),
        FTINT_W_D => Some((TintRound::Dynamic, false, true)),
        FTINT_L_S => Some((TintRound::Dynamic, true, false)),
        FTINT_L_D => Some((TintRound::Dynamic, true, true)),
        _ => None,
    }
}

fn ffint_lookup(op17: u32) -> Option<(bool, bool)> {
    // (src_is_64_bit, dst_is_double)
    match op17 {
        FFINT_S_W => Some((false, false)),
        FFINT_S_L => Some((true, false)),
        FFINT_D_W => Some((false, true)),
        FFINT_D_L => Some((true, true)),
        _ => None,
    }
}

/// Plain register-register (3R) and register (2R) FP opcodes.
pub fn try_decode_3r_or_2r<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op17 = opcode17(ctx.word);
    let f = fields::decode_3r(ctx.word);

    if matches!(op17, FMAXA_S | FMAXA_D | FMINA_S | FMINA_D) {
        if !require_fp(ctx) {
            return Some(illegal(ctx));
        }
        let double = matches!(op17, FMAXA_D | FMINA_D);
        let is_max = matches!(op17, FMAXA_S | FMAXA_D);
        let name = if is_max { "fmaxa" } else { "fmina" };
        let fp_op = if is_max { FpOp::Maxa } else { FpOp::Mina };
        let value = IrExpr::ExternalCall {
            name,
            args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::reg(GuestLoc::Fpr(f.rk)), IrExpr::constant(double as u64)],
        };
        emit_fcsr_update(ctx, fp_op);
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
        return Some(TranslationResult::continue_decoding());
    }

    if matches!(op17, FSCALEB_S | FSCALEB_D) {
        if !require_fp(ctx) {
            return Some(illegal(ctx));
        }
        let double = op17 == FSCALEB_D;
        let value = IrExpr::ExternalCall {
            name: "fscaleb",
            args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::reg(GuestLoc::Fpr(f.rk)), IrExpr::constant(double as u64)],
        };
        emit_fcsr_update(ctx, FpOp::Scaleb);
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
        return Some(TranslationResult::continue_decoding());
    }

    let bin: BinOp = match op17 {
        FADD_S | FADD_D => BinOp::FAdd,
        FSUB_S | FSUB_D => BinOp::FSub,
        FMUL_S | FMUL_D => BinOp::FMul,
        FDIV_S | FDIV_D => BinOp::FDiv,
        _ => return try_decode_2r(ctx),
    };

    if !require_fp(ctx) {
        return Some(illegal(ctx));
    }

    let rj = IrExpr::reg(GuestLoc::Fpr(f.rj));
    let rk = IrExpr::reg(GuestLoc::Fpr(f.rk));
    // §4.7: the FCSR update runs before the arithmetic assign so the
    // sticky exception flags reflect this operation's own status.
    emit_fcsr_update(ctx, fp_op_for(op17));
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value: IrExpr::bin(bin, rj, rk) });
    Some(TranslationResult::continue_decoding())
}

/// Only ever called with the four basic-arithmetic opcodes (the caller
/// has already dispatched every other opcode17 value elsewhere).
fn fp_op_for(op17: u32) -> FpOp {
    match op17 {
        FADD_S | FADD_D => FpOp::Add,
        FSUB_S | FSUB_D => FpOp::Sub,
        FMUL_S | FMUL_D => FpOp::Mul,
        _ => FpOp::Div,
    }
}

/// Merge `value` into the FCSR cause/flag view (view 2), preserving
/// the enable/rounding bits outside it — the IR-level equivalent of
/// [`crate::fcsr::write_view`], inlined since IR emission only builds
/// symbolic expressions over not-yet-known runtime values.
fn merge_fcsr_view(current: IrExpr, view: FcsrView, value: IrExpr) -> IrExpr {
    let mask = view.mask() as u64;
    let kept = IrExpr::bin(BinOp::And, current, IrExpr::constant(!mask));
    let incoming = IrExpr::bin(BinOp::And, value, IrExpr::constant(mask));
    IrExpr::bin(BinOp::Or, kept, incoming)
}

fn emit_fcsr_update<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, op: FpOp) {
    let raw = IrExpr::ExternalCall { name: "fcsr_after_op", args: vec![IrExpr::reg(GuestLoc::Fcsr0), IrExpr::constant(op as u64)] };
    let merged = merge_fcsr_view(IrExpr::reg(GuestLoc::Fcsr0), FcsrView::Cause, raw);
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fcsr0, value: merged });
}

fn try_decode_2r<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op17 = opcode17(ctx.word);
    let f = fields::decode_2r(ctx.word);

    if let Some((round, dst_long, src_double)) = ftint_lookup(op17) {
        if !require_fp(ctx) {
            return Some(illegal(ctx));
        }
        // §4.7: replaces the result with the architectural max-signed
        // value on invalid/overflow; folded into the single opaque
        // `ftint` helper call rather than branching the IR on the
        // FCSR's cause bits, keeping the vocabulary small.
        emit_fcsr_update(ctx, FpOp::Cvt);
        let value = IrExpr::ExternalCall {
            name: "ftint",
            args: vec![
                IrExpr::reg(GuestLoc::Fpr(f.rj)),
                IrExpr::constant(round as u64),
                IrExpr::constant(dst_long as u64),
                IrExpr::constant(src_double as u64),
            ],
        };
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
        return Some(TranslationResult::continue_decoding());
    }

    if let Some((src_long, dst_double)) = ffint_lookup(op17) {
        if !require_fp(ctx) {
            return Some(illegal(ctx));
        }
        emit_fcsr_update(ctx, FpOp::Cvt);
        let value = IrExpr::ExternalCall {
            name: "ffint",
            args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant(src_long as u64), IrExpr::constant(dst_double as u64)],
        };
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
        return Some(TranslationResult::continue_decoding());
    }

    match op17 {
        FABS_S | FABS_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let mask = if op17 == FABS_S { 0x7FFF_FFFFu64 } else { 0x7FFF_FFFF_FFFF_FFFFu64 };
            let value = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant(mask));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FNEG_S | FNEG_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let mask = if op17 == FNEG_S { 0x8000_0000u64 } else { 0x8000_0000_0000_0000u64 };
            let value = IrExpr::bin(BinOp::Xor, IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant(mask));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FLOGB_S | FLOGB_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "flogb", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant((op17 == FLOGB_D) as u64)] };
            emit_fcsr_update(ctx, FpOp::Logb);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FSQRT_S | FSQRT_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "fsqrt", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj))] };
            emit_fcsr_update(ctx, FpOp::Sqrt);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FRECIP_S | FRECIP_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "frecip", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant((op17 == FRECIP_D) as u64)] };
            emit_fcsr_update(ctx, FpOp::Recip);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FRSQRT_S | FRSQRT_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "frsqrt", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant((op17 == FRSQRT_D) as u64)] };
            emit_fcsr_update(ctx, FpOp::Rsqrt);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FCLASS_S | FCLASS_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "fclass", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant((op17 == FCLASS_D) as u64)] };
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        FCVT_S_D | FCVT_D_S => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let value = IrExpr::ExternalCall { name: "fcvt", args: vec![IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant((op17 == FCVT_D_S) as u64)] };
            emit_fcsr_update(ctx, FpOp::Cvt);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        _ => None,
    }
}

const MOVGR2FR_W: u32 = 0x4540;
const MOVGR2FR_D: u32 = 0x4541;
const MOVFR2GR_S: u32 = 0x4542;
const MOVFR2GR_D: u32 = 0x4543;
const MOVGR2FCSR: u32 = 0x4544;
const MOVFCSR2GR: u32 = 0x4545;
const MOVGR2FRH_W: u32 = 0x4546;
const MOVFRH2GR_S: u32 = 0x4547;
const MOVFR2CF: u32 = 0x4548;
const MOVCF2FR: u32 = 0x4549;
const MOVGR2CF: u32 = 0x454A;
const MOVCF2GR: u32 = 0x454B;

/// `mov{gr2fr,fr2gr,gr2fcsr,fcsr2gr,gr2frh,frh2gr,fr2cf,cf2fr,gr2cf,cf2gr}`
/// register-move family.
pub fn try_decode_move<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op17 = opcode17(ctx.word);
    let f = fields::decode_2r(ctx.word);

    match op17 {
        MOVGR2FR_W => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            // Open Question (spec §9): writes the full 64-bit FPR, not
            // just the low 32 bits — zero-extends the GPR source.
            let value = IrExpr::reg(GuestLoc::Gpr(f.rj));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        MOVGR2FR_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value: IrExpr::reg(GuestLoc::Gpr(f.rj)) });
            Some(TranslationResult::continue_decoding())
        }
        MOVFR2GR_S => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let low32 = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant(0xFFFF_FFFF));
            ctx.emit_gpr_write(f.rd, low32);
            Some(TranslationResult::continue_decoding())
        }
        MOVFR2GR_D => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            ctx.emit_gpr_write(f.rd, IrExpr::reg(GuestLoc::Fpr(f.rj)));
            Some(TranslationResult::continue_decoding())
        }
        MOVGR2FCSR => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let view = FcsrView::from_select_bits(f.rd);
            let incoming = IrExpr::reg(GuestLoc::Gpr(f.rj));
            let value = IrExpr::ExternalCall { name: "write_fcsr_view", args: vec![IrExpr::reg(GuestLoc::Fcsr0), IrExpr::constant(view_tag(view)), incoming] };
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fcsr0, value });
            Some(TranslationResult::continue_decoding())
        }
        MOVFCSR2GR => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let view = FcsrView::from_select_bits(f.rj);
            let masked = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fcsr0), IrExpr::constant(view.mask() as u64));
            ctx.emit_gpr_write(f.rd, masked);
            Some(TranslationResult::continue_decoding())
        }
        MOVGR2FRH_W => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            // Writes only the upper 32 bits of the FPR, preserving the
            // lower half — the complement of `movgr2fr.w`'s full-write.
            let low32 = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(f.rd)), IrExpr::constant(0xFFFF_FFFF));
            let incoming = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Gpr(f.rj)), IrExpr::constant(0xFFFF_FFFF));
            let high32 = IrExpr::bin(BinOp::Shl, incoming, IrExpr::constant(32));
            let value = IrExpr::bin(BinOp::Or, low32, high32);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(f.rd), value });
            Some(TranslationResult::continue_decoding())
        }
        MOVFRH2GR_S => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let high32 = IrExpr::bin(BinOp::ShrUnsigned, IrExpr::reg(GuestLoc::Fpr(f.rj)), IrExpr::constant(32));
            ctx.emit_gpr_write(f.rd, IrExpr::bin(BinOp::And, high32, IrExpr::constant(0xFFFF_FFFF)));
            Some(TranslationResult::continue_decoding())
        }
        MOVFR2CF => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let cd = fields::cd(ctx.word);
            let fj = fields::rj(ctx.word);
            let bit0 = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(fj)), IrExpr::constant(1));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fcc(cd), value: bit0 });
            Some(TranslationResult::continue_decoding())
        }
        MOVCF2FR => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let rd = fields::rd(ctx.word);
            let cj = fields::cj(ctx.word);
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(rd), value: IrExpr::reg(GuestLoc::Fcc(cj)) });
            Some(TranslationResult::continue_decoding())
        }
        MOVGR2CF => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let cd = fields::cd(ctx.word);
            let rj = fields::rj(ctx.word);
            let bit0 = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Gpr(rj)), IrExpr::constant(1));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fcc(cd), value: bit0 });
            Some(TranslationResult::continue_decoding())
        }
        MOVCF2GR => {
            if !require_fp(ctx) {
                return Some(illegal(ctx));
            }
            let rd = fields::rd(ctx.word);
            let cj = fields::cj(ctx.word);
            ctx.emit_gpr_write(rd, IrExpr::reg(GuestLoc::Fcc(cj)));
            Some(TranslationResult::continue_decoding())
        }
        _ => None,
    }
}

fn view_tag(view: FcsrView) -> u64 {
    match view {
        FcsrView::Whole => 0,
        FcsrView::Enables => 1,
        FcsrView::Cause => 2,
        FcsrView::Rounding => 3,
    }
}

const FCMP_COND_S: u32 = 0x0C;
const FCMP_COND_D: u32 = 0x0D;

/// `fcmp.cond.{s,d}`: writes an FCC flag from the comparison result
/// encoding (§4.7/GLOSSARY: UN=0x45, LT=0x01, GT=0x00, EQ=0x40).
pub fn try_decode_compare<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op10 = fields::extract(ctx.word, 20, 6);
    if op10 != FCMP_COND_S && op10 != FCMP_COND_D {
        return None;
    }
    if !require_fp(ctx) {
        return Some(illegal(ctx));
    }

    let double = op10 == FCMP_COND_D;
    let cond = fields::fcmp_cond(ctx.word);
    let fj = fields::rj(ctx.word);
    let fk = fields::rk(ctx.word);
    let cd = fields::cd(ctx.word);

    let value = IrExpr::ExternalCall {
        name: "fcmp",
        args: vec![
            IrExpr::reg(GuestLoc::Fpr(fj)),
            IrExpr::reg(GuestLoc::Fpr(fk)),
            IrExpr::constant(cond as u64),
            IrExpr::constant(double as u64),
        ],
    };
    emit_fcsr_update(ctx, FpOp::Compare);
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fcc(cd), value });
    Some(TranslationResult::continue_decoding())
}

const FMADD_S: u32 = 0x08;
const FMADD_D: u32 = 0x09;
const FMSUB_S: u32 = 0x0C;
const FMSUB_D: u32 = 0x0D;
const FNMADD_S: u32 = 0x10;
const FNMADD_D: u32 = 0x11;
const FNMSUB_S: u32 = 0x14;
const FNMSUB_D: u32 = 0x15;
const FSEL: u32 = 0x1A;

/// 4-register fused multiply-add family plus `fsel`, major `0b000011`.
pub fn try_decode_fma<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    let op = fields::extract(ctx.word, 20, 5);

    if op == FSEL {
        if !require_fp(ctx) {
            return Some(illegal(ctx));
        }
        let rd = fields::rd(ctx.word);
        let rj = fields::rj(ctx.word);
        let rk = fields::rk(ctx.word);
        let ca = fields::extract(ctx.word, 15, 3);
        // fd = ca ? fk : fj, via the same select-by-mask idiom as
        // `maskeqz`/`masknez` rather than a dedicated select opcode.
        let is_true = IrExpr::bin(BinOp::CmpNe, IrExpr::reg(GuestLoc::Fcc(ca as u8)), IrExpr::constant(0));
        let mask = IrExpr::bin(BinOp::Sub, IrExpr::constant(0), is_true);
        let from_rk = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(rk)), mask.clone());
        let inv_mask = IrExpr::bin(BinOp::Xor, mask, IrExpr::constant(u64::MAX));
        let from_rj = IrExpr::bin(BinOp::And, IrExpr::reg(GuestLoc::Fpr(rj)), inv_mask);
        let value = IrExpr::bin(BinOp::Or, from_rk, from_rj);
        ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(rd), value });
        return Some(TranslationResult::continue_decoding());
    }

    if !matches!(op, FMADD_S | FMADD_D | FMSUB_S | FMSUB_D | FNMADD_S | FNMADD_D | FNMSUB_S | FNMSUB_D) {
        return None;
    }
    if !require_fp(ctx) {
        return Some(illegal(ctx));
    }

    let rd = fields::rd(ctx.word);
    let rj = fields::rj(ctx.word);
    let rk = fields::rk(ctx.word);
    let fa = fields::fa(ctx.word);

    let product = IrExpr::bin(BinOp::FMul, IrExpr::reg(GuestLoc::Fpr(rj)), IrExpr::reg(GuestLoc::Fpr(rk)));
    let addend = IrExpr::reg(GuestLoc::Fpr(fa));

    let value = match op {
        FMADD_S | FMADD_D => IrExpr::bin(BinOp::FAdd, product, addend),
        FMSUB_S | FMSUB_D => IrExpr::bin(BinOp::FSub, product, addend),
        FNMADD_S | FNMADD_D => IrExpr::ExternalCall { name: "fneg", args: vec![IrExpr::bin(BinOp::FAdd, product, addend)] },
        _ => IrExpr::ExternalCall { name: "fneg", args: vec![IrExpr::bin(BinOp::FSub, product, addend)] },
    };

    emit_fcsr_update(ctx, FpOp::Madd);
    ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Fpr(rd), value });
    Some(TranslationResult::continue_decoding())
}

/// Translate a LoongArch64 rounding mode field into the IR's own
/// encoding, used by `ftint*`/`fcvt` emitters (not yet broken out into
/// their own opcodes here, reserved for future expansion alongside
/// the vector extensions this crate excludes per Non-goals).
pub fn translate_rounding_mode(rm_bits: u8) -> u8 {
    fcsr::la_rm_to_ir_rm(rm_bits)
}
