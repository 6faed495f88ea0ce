//! Treasure Code Entry
//!
//! - **code**: keystroke sanitising and the seven-digit code type
//! - **form**: the entry view state and the lookup-then-insert submission

mod code;
mod form;

pub use code::{sanitize, InvalidCode, TreasureCode, CODE_LENGTH};
pub use form::{
    EntryForm, ErrorKind, SubmitError, SubmitOutcome, SubmitPhase, Submission, UnknownTeam,
};
