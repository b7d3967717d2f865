//! §4.9 "special" preamble recognition.
//!
//! A 16-byte run of four specific `srli.d $zero, $zero, n` no-ops
//! followed by one of four marker `or` no-ops signals the hosting
//! framework to perform an action instead of ordinary guest code. The
//! four shift words are matched against `ctx.word` one at a time as
//! the caller re-invokes [`try_decode`] per fetched word — mirroring
//! how the teacher's `trace_file.rs` consumes a record stream one item
//! at a time rather than buffering the whole thing up front.
//!
//! This crate decodes one instruction per call (§1), so recognizing
//! the full 20-byte sequence requires the first word to already be the
//! first shift AND the following 16 bytes to be supplied by the
//! caller up front; `ctx.word` is only 32 bits wide, so the preamble
//! match here only fires on `try_decode_full` when the caller has
//! assembled all five words into `ctx.preamble_words`. Ordinary
//! per-word decode never recognizes a lone shift as a preamble start.

use crate::error::DecodeError;
use crate::helpers::ExternalHelpers;
use crate::ir::{ExitTarget, GuestLoc, IrExpr, IrStmt, JumpKind};
use crate::result::{StopReason, TranslationResult};

use super::DecodeContext;

const SHIFT_AMOUNTS: [u32; 4] = [3, 13, 29, 19];

fn srli_d_word(shamt: u32) -> u32 {
    // srli.d $zero, $zero, shamt: rd=0, rj=0, major/opcode bits for
    // the doubleword shift-right-logical-immediate family, ui6 field
    // carrying the shift amount.
    0x0044_0000u32 | (shamt << 10)
}

// Matches `fixed_point::OR`'s 3R opcode17 encoding.
const OR_OPCODE17: u32 = 0x2A;

fn marker_or_word(reg: u8) -> u32 {
    // or $t{n}, $t{n}, $t{n}: ordinary 3R `or` with rd=rj=rk=reg.
    (OR_OPCODE17 << 15) | ((reg as u32) << 10) | ((reg as u32) << 5) | (reg as u32)
}

// LA64 ABI register numbers used by the per-marker effects below.
const REG_RA: u8 = 1;
const REG_A7: u8 = 11;
const REG_T0: u8 = 12;
const REG_T8: u8 = 20;

const PREAMBLE_LEN: u64 = 20;

/// Recognizes the preamble when the caller has assembled the full
/// five-word, 20-byte run into `words`. Returns `None` (not this
/// decoder's business) unless the first word matches the first shift
/// exactly, at which point any mismatch in the remaining four words is
/// a fatal decode failure per §7 ("the preamble is chosen to never
/// occur naturally").
pub fn try_decode_words<H: ExternalHelpers>(ctx: &mut DecodeContext<'_, H>, words: &[u32; 5]) -> Option<TranslationResult> {
    if words[0] != srli_d_word(SHIFT_AMOUNTS[0]) {
        return None;
    }
    for (word, shamt) in words[1..4].iter().zip(&SHIFT_AMOUNTS[1..]) {
        if *word != srli_d_word(*shamt) {
            panic!("{}", DecodeError::MalformedPreamble { pc: ctx.guest_pc, follow_up: *word });
        }
    }

    // $t1=13, $t2=14, $t3=15, $t4=16 in the usual LA64 register naming.
    let marker = if words[4] == marker_or_word(13) {
        Marker::ClientRequest
    } else if words[4] == marker_or_word(14) {
        Marker::NraddrQuery
    } else if words[4] == marker_or_word(15) {
        Marker::NoRedirJump
    } else if words[4] == marker_or_word(16) {
        Marker::IrInjection
    } else {
        panic!("{}", DecodeError::MalformedPreamble { pc: ctx.guest_pc, follow_up: words[4] });
    };

    match marker {
        // $t1: hand the pending request off to the host and route its
        // result back through $a7, carrying $t0 along as the second
        // argument the handler expects.
        Marker::ClientRequest => {
            ctx.builder.emit(IrStmt::Inject { payload: ctx.guest_pc });
            let a7 = IrExpr::reg(GuestLoc::Gpr(REG_A7));
            let t0 = IrExpr::reg(GuestLoc::Gpr(REG_T0));
            let handled = IrExpr::ExternalCall { name: "client_request_handler", args: vec![a7, t0] };
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Gpr(REG_A7), value: handled });
            Some(TranslationResult::stop_with_length(StopReason::ClientRequest, PREAMBLE_LEN as u8, 0))
        }
        // $t2: answer an NRADDR query by copying the guest-side NRADDR
        // pseudo-register into $a7; this never hands control to the
        // host, so decoding simply carries on into the next instruction.
        Marker::NraddrQuery => {
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Gpr(REG_A7), value: IrExpr::reg(GuestLoc::NextRedirect) });
            Some(TranslationResult::continue_with_length(StopReason::NraddrQuery, PREAMBLE_LEN as u8, 1))
        }
        // $t3: link the return address into $ra and jump to $t8,
        // bypassing the host's ordinary NRADDR redirection.
        Marker::NoRedirJump => {
            let t8 = IrExpr::reg(GuestLoc::Gpr(REG_T8));
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Gpr(REG_RA), value: IrExpr::constant(ctx.guest_pc.wrapping_add(PREAMBLE_LEN)) });
            ctx.builder.emit(IrStmt::Assign { dst: GuestLoc::Pc, value: t8.clone() });
            ctx.builder.emit(IrStmt::Exit { guarded: None, target: ExitTarget::Dynamic(t8), kind: JumpKind::NoRedir });
            Some(TranslationResult::stop_with_length(StopReason::NoRedirJump, PREAMBLE_LEN as u8, 2))
        }
        Marker::IrInjection => {
            ctx.builder.emit(IrStmt::Inject { payload: ctx.guest_pc });
            ctx.builder.emit(IrStmt::InvalidateIcacheLine { payload: PREAMBLE_LEN });
            Some(TranslationResult::stop_with_length(StopReason::IrInjection, PREAMBLE_LEN as u8, 3))
        }
    }
}

enum Marker {
    ClientRequest,
    NraddrQuery,
    NoRedirJump,
    IrInjection,
}

/// Single-word entry point used by the top-level cascade: a lone shift
/// matching the first preamble word is inconclusive on its own (the
/// caller owns the 20-byte lookahead buffer needed to confirm the full
/// run), so this never claims the word — it exists only so `decode()`
/// has a stable hook name per §4.10's description of the preamble as
/// the first thing the dispatcher checks.
pub fn try_decode<H: ExternalHelpers>(_ctx: &mut DecodeContext<'_, H>) -> Option<TranslationResult> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Abi, ArchCaps};
    use crate::ir::RecordingBuilder;
    use crate::testutil::NoopHelpers;

    fn words_for(marker_reg: u8) -> [u32; 5] {
        [srli_d_word(3), srli_d_word(13), srli_d_word(29), srli_d_word(19), marker_or_word(marker_reg)]
    }

    #[test]
    fn client_request_marker_consumes_twenty_bytes() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let mut ctx = DecodeContext { word: words_for(13)[0], guest_pc: 0x1000, caps: &caps, abi: &abi, host_little_endian: true, sigill_diag: false, builder: &mut builder, helpers: &helpers };
        let result = try_decode_words(&mut ctx, &words_for(13)).expect("should recognize preamble");
        assert_eq!(result.length, 20);
        assert_eq!(result.stop_reason, Some(StopReason::ClientRequest));
    }

    #[test]
    fn non_preamble_first_word_is_not_claimed() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let words = [0x0010_0000u32, 0, 0, 0, 0];
        let mut ctx = DecodeContext { word: words[0], guest_pc: 0x1000, caps: &caps, abi: &abi, host_little_endian: true, sigill_diag: false, builder: &mut builder, helpers: &helpers };
        assert!(try_decode_words(&mut ctx, &words).is_none());
    }

    #[test]
    #[should_panic(expected = "unrecognized marker")]
    fn mismatched_follow_up_is_fatal() {
        let caps = ArchCaps::all();
        let abi = Abi::default();
        let helpers = NoopHelpers;
        let mut builder = RecordingBuilder::new();
        let mut words = words_for(13);
        words[4] = 0xDEAD_BEEF;
        let mut ctx = DecodeContext { word: words[0], guest_pc: 0x1000, caps: &caps, abi: &abi, host_little_endian: true, sigill_diag: false, builder: &mut builder, helpers: &helpers };
        let _ = try_decode_words(&mut ctx, &words);
    }
}
