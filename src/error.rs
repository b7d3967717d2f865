//! Typed errors for the narrower, `Result`-returning APIs in this
//! crate. The top-level [`crate::decode::decode`] never returns one of
//! these directly — a decode failure is absorbed into
//! [`crate::result::TranslationResult`]'s `NoDecode` stop-reason, per
//! §7 — but individual dispatch-cascade layers and tests that want to
//! assert "this word does not decode" without going through the full
//! `TranslationResult` machinery use `DecodeError::NoDecode` instead.

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("instruction word 0x{word:08x} at guest pc 0x{pc:x} does not match any known encoding")]
    NoDecode { word: u32, pc: u64 },

    #[error("special preamble at 0x{pc:x} followed by unrecognized marker 0x{follow_up:08x}")]
    MalformedPreamble { pc: u64, follow_up: u32 },
}
