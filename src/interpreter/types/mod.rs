//! Type definitions for the interpreter
//!
//! - Token frames and source positions
//! - Decoded instructions (Op)
//! - Runtime values (Val)

pub mod frame;
pub mod op;
pub mod values;

pub use frame::{Seed, SourcePos, TokenFrame};
pub use op::{Op, BLOCK_CLOSE, BLOCK_OPEN};
pub use values::Val;
