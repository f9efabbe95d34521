// Execution engine for the bytecode interpreter

use crate::codegen::{Instr, Module};
use crate::interpreter::constants::ExecutionLimits;
use crate::interpreter::errors::RuntimeError;
use crate::memory::{ActivationRecord, CallStack, GlobalStore, Value};
use crate::parser::ast::{BinOp, SourceLocation};
use crate::terminal::Terminal;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Value returned by `main`, if it returns `int`
    pub exit_value: Option<i32>,
    /// Instructions executed
    pub steps: u64,
}

/// Executes a lowered [`Module`]
pub struct Interpreter<'m, R, W> {
    module: &'m Module,

    /// Activation records and operands
    stack: CallStack,

    globals: GlobalStore,

    /// Where the intrinsics read and write
    pub(crate) terminal: Terminal<R, W>,

    limits: ExecutionLimits,

    steps: u64,

    /// Location of the instruction being executed
    pub(crate) current_location: SourceLocation,
}

impl<'m, R: BufRead, W: Write> Interpreter<'m, R, W> {
    pub fn new(module: &'m Module, terminal: Terminal<R, W>, limits: ExecutionLimits) -> Self {
        Interpreter {
            module,
            stack: CallStack::new(limits.max_call_depth),
            globals: GlobalStore::new(&module.globals),
            terminal,
            limits,
            steps: 0,
            current_location: SourceLocation::default(),
        }
    }

    /// Run `main` to completion
    pub fn run(&mut self) -> Result<RunOutcome, RuntimeError> {
        let module = self.module;
        let entry = module
            .functions
            .get(module.entry)
            .ok_or_else(|| self.invalid(format!("no function #{} to start at", module.entry)))?;

        debug!(entry = %entry.name, "execution started");
        self.push_frame(module.entry, Vec::new())?;

        let result = self.execute();

        // Output already produced is kept even when the run fails
        let flushed = self.terminal.flush();
        let exit_value = result?;
        flushed.map_err(|err| RuntimeError::IntrinsicIoFailure {
            operation: "output",
            message: format!("failed to flush output: {}", err),
            location: self.current_location,
        })?;

        debug!(steps = self.steps, "execution finished");
        Ok(RunOutcome {
            exit_value,
            steps: self.steps,
        })
    }

    pub fn globals(&self) -> &GlobalStore {
        &self.globals
    }

    pub fn terminal(&self) -> &Terminal<R, W> {
        &self.terminal
    }

    /// Fetch-execute loop; returns `main`'s value once the last frame returns
    fn execute(&mut self) -> Result<Option<i32>, RuntimeError> {
        let module = self.module;

        loop {
            let frame = self
                .stack
                .current_frame_mut()
                .ok_or_else(|| RuntimeError::InvalidBytecode {
                    message: "no frame to execute".to_string(),
                    location: SourceLocation::default(),
                })?;
            let (function_index, pc) = (frame.function, frame.pc);
            frame.pc += 1;

            let function = module
                .functions
                .get(function_index)
                .ok_or_else(|| self.invalid(format!("no function #{}", function_index)))?;
            self.current_location = function.location_of(pc);
            let instr = *function
                .code
                .get(pc)
                .ok_or_else(|| self.invalid(format!("'{}' ran past its code", function.name)))?;

            self.count_step()?;

            match instr {
                Instr::PushInt(n) => self.stack.push(Value::Int(n)),
                Instr::PushChar(c) => self.stack.push(Value::Char(c)),
                Instr::PushStr(id) => self.stack.push(Value::Str(id)),

                Instr::LoadLocal(slot) => {
                    let value = self.local_slot(slot).map(|v| *v)?;
                    self.stack.push(value);
                }
                Instr::StoreLocal(slot) => {
                    let value = self.pop()?;
                    *self.local_slot(slot)? = value;
                }
                Instr::LoadGlobal(index) => {
                    let value = self
                        .globals
                        .get(index)
                        .ok_or_else(|| self.invalid(format!("no global #{}", index)))?;
                    self.stack.push(value);
                }
                Instr::StoreGlobal(index) => {
                    let value = self.pop()?;
                    if !self.globals.set(index, value) {
                        return Err(self.invalid(format!("no global #{}", index)));
                    }
                }

                Instr::Widen => {
                    let n = self.pop_integral()?;
                    self.stack.push(Value::Int(n));
                }
                Instr::Binary(op) => {
                    let right = self.pop_integral()?;
                    let left = self.pop_integral()?;
                    let result = self.binary_op(op, left, right)?;
                    self.stack.push(Value::Int(result));
                }
                Instr::Neg => {
                    let n = self.pop_integral()?;
                    self.stack.push(Value::Int(n.wrapping_neg()));
                }

                Instr::Jump(target) => self.jump(target)?,
                Instr::JumpIfZero(target) => {
                    if self.pop_integral()? == 0 {
                        self.jump(target)?;
                    }
                }

                Instr::Call { function, argc } => {
                    let args = self
                        .stack
                        .pop_n(argc)
                        .ok_or_else(|| self.invalid(format!("call needs {} arguments", argc)))?;
                    self.push_frame(function, args)?;
                }
                Instr::CallIntrinsic(intrinsic) => self.call_intrinsic(intrinsic)?,

                Instr::Return => {
                    let value = self.pop()?;
                    self.pop_frame();
                    if self.stack.is_empty() {
                        return Ok(value.as_integral());
                    }
                    self.stack.push(value);
                }
                Instr::ReturnVoid => {
                    self.pop_frame();
                    if self.stack.is_empty() {
                        return Ok(None);
                    }
                }

                Instr::Pop => {
                    self.pop()?;
                }
                Instr::Dup => {
                    let value = self
                        .stack
                        .peek()
                        .ok_or_else(|| self.invalid("operand stack underflow"))?;
                    self.stack.push(value);
                }
            }
        }
    }

    /// Prologue: a zeroed frame with the arguments bound to the first slots
    fn push_frame(&mut self, function: usize, args: Vec<Value>) -> Result<(), RuntimeError> {
        let module = self.module;
        let callee = module
            .functions
            .get(function)
            .ok_or_else(|| self.invalid(format!("no function #{}", function)))?;
        if args.len() != callee.param_count {
            return Err(self.invalid(format!(
                "'{}' takes {} arguments, got {}",
                callee.name,
                callee.param_count,
                args.len()
            )));
        }

        let mut record =
            ActivationRecord::new(function, &callee.slot_types, self.stack.operand_count());
        for (slot, value) in record.locals.iter_mut().zip(args) {
            *slot = value;
        }

        self.stack
            .push_frame(record)
            .map_err(|exceeded| RuntimeError::StackOverflow {
                limit: exceeded.limit,
                location: self.current_location,
            })?;

        trace!(function = %callee.name, depth = self.stack.depth(), "call");
        Ok(())
    }

    /// Epilogue: drop the frame and anything it left on the operand stack
    fn pop_frame(&mut self) {
        if let Some(record) = self.stack.pop_frame() {
            trace!(function = record.function, depth = self.stack.depth(), "return");
        }
    }

    fn binary_op(&self, op: BinOp, left: i32, right: i32) -> Result<i32, RuntimeError> {
        let result = match op {
            BinOp::Add => left.wrapping_add(right),
            BinOp::Sub => left.wrapping_sub(right),
            BinOp::Mul => left.wrapping_mul(right),
            BinOp::Div | BinOp::Mod if right == 0 => {
                return Err(RuntimeError::DivisionByZero {
                    operation: if op == BinOp::Div {
                        "division"
                    } else {
                        "remainder"
                    },
                    location: self.current_location,
                });
            }
            BinOp::Div => left.wrapping_div(right),
            BinOp::Mod => left.wrapping_rem(right),
            BinOp::Eq => i32::from(left == right),
            BinOp::Ne => i32::from(left != right),
            BinOp::Lt => i32::from(left < right),
            BinOp::Le => i32::from(left <= right),
            BinOp::Gt => i32::from(left > right),
            BinOp::Ge => i32::from(left >= right),
        };
        Ok(result)
    }

    fn count_step(&mut self) -> Result<(), RuntimeError> {
        if let Some(limit) = self.limits.max_steps {
            if self.steps >= limit {
                return Err(RuntimeError::StepLimitExceeded {
                    limit,
                    location: self.current_location,
                });
            }
        }
        self.steps += 1;
        Ok(())
    }

    fn jump(&mut self, target: usize) -> Result<(), RuntimeError> {
        let frame = self
            .stack
            .current_frame_mut()
            .ok_or_else(|| RuntimeError::InvalidBytecode {
                message: "jump without a frame".to_string(),
                location: SourceLocation::default(),
            })?;
        frame.pc = target;
        Ok(())
    }

    fn local_slot(&mut self, slot: usize) -> Result<&mut Value, RuntimeError> {
        let location = self.current_location;
        self.stack
            .current_frame_mut()
            .and_then(|frame| frame.locals.get_mut(slot))
            .ok_or_else(|| RuntimeError::InvalidBytecode {
                message: format!("no local slot {}", slot),
                location,
            })
    }

    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| self.invalid("operand stack underflow"))
    }

    pub(crate) fn pop_integral(&mut self) -> Result<i32, RuntimeError> {
        let value = self.pop()?;
        value
            .as_integral()
            .ok_or_else(|| self.invalid(format!("expected int or char, found {}", value.type_name())))
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(crate) fn module(&self) -> &'m Module {
        self.module
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::InvalidBytecode {
            message: message.into(),
            location: self.current_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::compile;
    use crate::terminal::MemoryTerminal;

    fn module(source: &str) -> Module {
        compile(source).unwrap().module
    }

    #[test]
    fn test_globals_hold_final_values() {
        let module = module("int total; char last; void main() { total = 40 + 2; last = 'z'; }");
        let mut interp = Interpreter::new(
            &module,
            MemoryTerminal::in_memory(""),
            ExecutionLimits::default(),
        );
        let outcome = interp.run().unwrap();

        assert_eq!(
            interp.globals().values(),
            &[Value::Int(42), Value::Char(b'z' as i8)]
        );
        assert_eq!(outcome.exit_value, None);
        assert!(outcome.steps > 0);
    }

    #[test]
    fn test_steps_are_counted_per_instruction() {
        let module = module("int main() { return 5; }");
        let mut interp = Interpreter::new(
            &module,
            MemoryTerminal::in_memory(""),
            ExecutionLimits::default(),
        );
        let outcome = interp.run().unwrap();

        // push.i 5, ret
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.exit_value, Some(5));
    }

    #[test]
    fn test_step_limit_is_exact() {
        let module = module("int main() { return 5; }");
        let limits = ExecutionLimits {
            max_steps: Some(1),
            ..ExecutionLimits::default()
        };
        let mut interp = Interpreter::new(&module, MemoryTerminal::in_memory(""), limits);
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::StepLimitExceeded { limit: 1, .. })
        ));
    }
}
