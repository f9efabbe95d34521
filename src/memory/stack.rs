//! Call stack implementation
//!
//! This module provides the call stack for function execution:
//! - [`CallStack`]: the activation records plus the shared operand stack
//! - [`ActivationRecord`]: a single function call's frame
//!
//! # Frames and operands
//!
//! Every record remembers how tall the operand stack was when it was entered
//! (`operand_base`). Popping a record truncates the operand stack back to that
//! height, so a returning call never leaves temporaries behind.
//!
//! The number of live records is capped. Pushing past the cap fails with
//! [`DepthExceeded`] instead of growing without bound.

use super::value::Value;
use crate::parser::ast::Type;
use thiserror::Error;

/// Activation record for a function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRecord {
    /// Index of the running function in the module
    pub function: usize,
    /// Next instruction to execute
    pub pc: usize,
    /// Parameters first, then locals
    pub locals: Vec<Value>,
    pub operand_base: usize,
}

impl ActivationRecord {
    /// A frame with every slot zeroed for its type
    pub fn new(function: usize, slot_types: &[Type], operand_base: usize) -> Self {
        ActivationRecord {
            function,
            pc: 0,
            locals: slot_types.iter().map(|ty| Value::zero(*ty)).collect(),
            operand_base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call depth limit of {limit} exceeded")]
pub struct DepthExceeded {
    pub limit: usize,
}

/// Call stack containing frames
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<ActivationRecord>,
    operands: Vec<Value>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            operands: Vec::new(),
            max_depth,
        }
    }

    /// Push a new frame
    pub fn push_frame(&mut self, record: ActivationRecord) -> Result<(), DepthExceeded> {
        if self.frames.len() >= self.max_depth {
            return Err(DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.frames.push(record);
        Ok(())
    }

    /// Pop the current frame, discarding its operands
    pub fn pop_frame(&mut self) -> Option<ActivationRecord> {
        let record = self.frames.pop()?;
        self.operands.truncate(record.operand_base);
        Some(record)
    }

    /// Get the current frame
    pub fn current_frame(&self) -> Option<&ActivationRecord> {
        self.frames.last()
    }

    /// Get the current frame mutably
    pub fn current_frame_mut(&mut self) -> Option<&mut ActivationRecord> {
        self.frames.last_mut()
    }

    /// Get the call depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.operands.push(value);
    }

    /// Pop an operand belonging to the current frame
    pub fn pop(&mut self) -> Option<Value> {
        let base = self.current_frame().map_or(0, |frame| frame.operand_base);
        if self.operands.len() > base {
            self.operands.pop()
        } else {
            None
        }
    }

    /// Remove the top `n` operands of the current frame, oldest first
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<Value>> {
        let base = self.current_frame().map_or(0, |frame| frame.operand_base);
        let start = self.operands.len().checked_sub(n)?;
        if start < base {
            return None;
        }
        Some(self.operands.split_off(start))
    }

    pub fn peek(&self) -> Option<Value> {
        self.operands.last().copied()
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_zero_their_slots() {
        let record = ActivationRecord::new(0, &[Type::Int, Type::Char], 0);
        assert_eq!(record.locals, vec![Value::Int(0), Value::Char(0)]);
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = CallStack::new(2);
        stack.push_frame(ActivationRecord::new(0, &[], 0)).unwrap();
        stack.push_frame(ActivationRecord::new(0, &[], 0)).unwrap();
        assert_eq!(
            stack.push_frame(ActivationRecord::new(0, &[], 0)),
            Err(DepthExceeded { limit: 2 })
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_pop_frame_discards_operands() {
        let mut stack = CallStack::new(8);
        stack.push_frame(ActivationRecord::new(0, &[], 0)).unwrap();
        stack.push(Value::Int(1));

        let base = stack.operand_count();
        stack.push_frame(ActivationRecord::new(1, &[], base)).unwrap();
        stack.push(Value::Int(2));
        stack.push(Value::Int(3));

        stack.pop_frame();
        assert_eq!(stack.operand_count(), 1);
        assert_eq!(stack.peek(), Some(Value::Int(1)));
    }

    #[test]
    fn test_pop_does_not_cross_frame_base() {
        let mut stack = CallStack::new(8);
        stack.push_frame(ActivationRecord::new(0, &[], 0)).unwrap();
        stack.push(Value::Int(1));
        stack.push_frame(ActivationRecord::new(1, &[], 1)).unwrap();

        assert_eq!(stack.pop(), None);
        assert_eq!(stack.pop_n(1), None);
    }

    #[test]
    fn test_pop_n_keeps_order() {
        let mut stack = CallStack::new(8);
        stack.push_frame(ActivationRecord::new(0, &[], 0)).unwrap();
        stack.push(Value::Int(1));
        stack.push(Value::Char(2));
        assert_eq!(stack.pop_n(2), Some(vec![Value::Int(1), Value::Char(2)]));
        assert_eq!(stack.pop_n(0), Some(vec![]));
    }
}
