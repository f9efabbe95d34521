//! Runtime memory for the virtual machine
//!
//! - [`value`]: tagged runtime values (`int`, `char`, string literal handles)
//! - [`stack`]: the call stack of activation records and the operand stack
//! - [`globals`]: the global store shared by every function
//!
//! All storage starts zeroed. There is no heap and no addressable memory.

pub mod globals;
pub mod stack;
pub mod value;

pub use globals::GlobalStore;
pub use stack::{ActivationRecord, CallStack};
pub use value::Value;
