//! The translation-result record returned by [`crate::decode::decode`].

/// What the caller's translation-unit loop should do after this
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Keep decoding subsequent instructions into the same unit.
    Continue,
    /// End the translation unit here; the emitted IR already contains
    /// whatever exit/redirect is needed.
    StopHere,
}

/// Why a translation unit ended (or, for the `continue_with_reason`
/// family, merely took a guarded side exit) at this instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The word did not match any known encoding.
    NoDecode,
    /// A capability-gated opcode was used without the capability.
    IllegalInstruction,
    /// An unconditional or taken control-flow transfer occurred.
    ControlFlow,
    /// A client-request ($t1 preamble marker) was decoded.
    ClientRequest,
    /// A guarded compare-and-swap in an AM*-class atomic failed and
    /// re-enters the same instruction (§9 Open Question).
    AtomicRetry,
    /// A guarded misaligned-access exit (`SigBUS`) was emitted.
    AlignmentFault,
    /// A `ldgt`/`ldle`/`stgt`/`stle`-family bound comparison failed
    /// (`SigSYS`).
    BoundsCheck,
    /// A `syscall` was emitted (`Sys_syscall`).
    Syscall,
    /// A `break` trap was emitted (`SigTRAP`).
    Trap,
    /// The $t2 preamble marker (NRADDR query) was decoded.
    NraddrQuery,
    /// The $t3 preamble marker (no-redirect jump) was decoded.
    NoRedirJump,
    /// The $t4 preamble marker (IR injection) was decoded.
    IrInjection,
}

/// Outcome of decoding one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationResult {
    /// Number of guest bytes consumed: 0 (no decode), 4 (ordinary
    /// instruction), or 20 (the special preamble, §4.9).
    pub length: u8,
    pub next_action: NextAction,
    pub stop_reason: Option<StopReason>,
    /// Opaque hint value threaded through for `stop_reason`s that
    /// carry extra payload (e.g. which client request kind).
    pub hint: u64,
}

impl TranslationResult {
    pub fn no_decode() -> Self {
        Self { length: 0, next_action: NextAction::StopHere, stop_reason: Some(StopReason::NoDecode), hint: 0 }
    }

    pub fn continue_decoding() -> Self {
        Self { length: 4, next_action: NextAction::Continue, stop_reason: None, hint: 0 }
    }

    pub fn stop(reason: StopReason, hint: u64) -> Self {
        Self { length: 4, next_action: NextAction::StopHere, stop_reason: Some(reason), hint }
    }

    pub fn stop_with_length(reason: StopReason, length: u8, hint: u64) -> Self {
        Self { length, next_action: NextAction::StopHere, stop_reason: Some(reason), hint }
    }

    /// Like [`Self::continue_decoding`], but tags the result with a
    /// concrete `reason` for a guarded side exit that does not halt the
    /// translation unit (e.g. an atomic retry or an alignment guard) —
    /// the emitted IR already contains the conditional `Exit`; decoding
    /// carries straight on into the following instruction.
    pub fn continue_with_reason(reason: StopReason, hint: u64) -> Self {
        Self { length: 4, next_action: NextAction::Continue, stop_reason: Some(reason), hint }
    }

    /// Like [`Self::continue_with_reason`], but for callers (the
    /// preamble) whose consumed length isn't the ordinary 4 bytes.
    pub fn continue_with_length(reason: StopReason, length: u8, hint: u64) -> Self {
        Self { length, next_action: NextAction::Continue, stop_reason: Some(reason), hint }
    }
}
