#![forbid(unsafe_code)]

//! LoongArch64 guest-to-IR instruction decoder core.
//!
//! The crate decodes one LA64 instruction word per call and appends a
//! semantically equivalent IR sequence into a caller-supplied
//! [`ir::IrBuilder`]. See `SPEC_FULL.md` for the full component design;
//! [`decode::decode`] is the public entry point.

pub mod capabilities;
pub mod decode;
pub mod error;
pub mod fcsr;
pub mod fields;
pub mod guest_state;
pub mod helpers;
pub mod ir;
pub mod result;

#[cfg(test)]
pub mod testutil;

pub use capabilities::{Abi, ArchCaps};
pub use decode::{decode, DecodeContext};
pub use error::DecodeError;
pub use guest_state::{GuestState, Width};
pub use helpers::{ExternalHelpers, FpOp};
pub use ir::{BinOp, ExitTarget, GuestLoc, IrBuilder, IrExpr, IrStmt, JumpKind, TempId, UnOp};
pub use result::{NextAction, StopReason, TranslationResult};
