//! Architecture capability set and ABI record.
//!
//! The real host framework probes the running CPU once and reuses the
//! result for every translation; this crate only needs a cheap value
//! type to carry that result into [`crate::decode`].

/// Capability bits gating instructions and trap behaviour.
///
/// Plain booleans rather than a bitflags type, matching the teacher's
/// preference (`Platform`, `PmaChecker`) for a handful of named struct
/// fields over a flags crate it never pulls in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchCaps {
    /// Floating point unit present; gates every FP opcode.
    pub fp: bool,
    /// Unaligned-access capability; when set, alignment traps are
    /// suppressed for loads/stores that would otherwise fault.
    pub ual: bool,
    /// LAM (atomic memory access) extension; gates the `am*` family.
    pub lam: bool,
    /// CPUCFG instruction present.
    pub cpucfg: bool,
}

impl ArchCaps {
    pub fn all() -> Self {
        Self { fp: true, ual: true, lam: true, cpucfg: true }
    }
}

/// ABI-level knobs that affect code generation but not legality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abi {
    /// When set, LL/SC is lowered through the CAS-based fallback path
    /// (§4.6) instead of relying on a native host LL/SC pair.
    pub use_fallback_llsc: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_caps_enables_everything() {
        let caps = ArchCaps::all();
        assert!(caps.fp && caps.ual && caps.lam && caps.cpucfg);
    }

    #[test]
    fn default_caps_enables_nothing() {
        let caps = ArchCaps::default();
        assert!(!caps.fp && !caps.ual && !caps.lam && !caps.cpucfg);
    }
}
