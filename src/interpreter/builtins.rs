//! Built-in function implementations
//!
//! This module provides the intrinsics every program can call without
//! declaring them. They are handled by the interpreter directly rather than
//! being compiled from user code.
//!
//! # Supported Built-ins
//!
//! - `read_i()`: skip whitespace, then read an optionally signed decimal `int`
//! - `read_c()`: read the next raw input byte as a `char`
//! - `print_i(int)`, `print_c(char)`, `print_s(string)`: write the value with
//!   no separator or newline added
//!
//! # Implementation Notes
//!
//! - Output is flushed before each read, so prompts appear before input blocks
//! - `read_i` stops at the first non-digit and leaves it unread
//! - End of input, malformed numbers and write errors are all
//!   [`RuntimeError::IntrinsicIoFailure`]
//! - All built-ins are implemented as methods on the [`Interpreter`] struct

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::semantic::Intrinsic;
use std::io::{self, BufRead, Write};

impl<R: BufRead, W: Write> Interpreter<'_, R, W> {
    pub(crate) fn call_intrinsic(&mut self, intrinsic: Intrinsic) -> Result<(), RuntimeError> {
        match intrinsic {
            Intrinsic::ReadI => {
                let n = self.builtin_read_i()?;
                self.push(Value::Int(n));
            }
            Intrinsic::ReadC => {
                let c = self.builtin_read_c()?;
                self.push(Value::Char(c));
            }
            Intrinsic::PrintI => {
                let n = self.pop_integral()?;
                self.write_output(intrinsic, n.to_string().as_bytes())?;
            }
            Intrinsic::PrintC => {
                let c = self.pop_integral()?;
                // Only the low byte of a char is meaningful
                self.write_output(intrinsic, &[c as u8])?;
            }
            Intrinsic::PrintS => {
                let value = self.pop()?;
                let module = self.module();
                let text = value
                    .as_str_id()
                    .and_then(|id| module.strings.get(id))
                    .ok_or_else(|| {
                        self.invalid(format!("print_s needs a string, found {}", value.type_name()))
                    })?;
                self.write_output(intrinsic, text.as_bytes())?;
            }
        }
        Ok(())
    }

    fn builtin_read_i(&mut self) -> Result<i32, RuntimeError> {
        let intrinsic = Intrinsic::ReadI;

        // Skip leading whitespace
        loop {
            match self.peek_input(intrinsic)? {
                Some(byte) if byte.is_ascii_whitespace() => {
                    self.read_input(intrinsic)?;
                }
                Some(_) => break,
                None => return Err(self.io_failure(intrinsic, "unexpected end of input")),
            }
        }

        let mut negative = false;
        if let Some(sign @ (b'-' | b'+')) = self.peek_input(intrinsic)? {
            self.read_input(intrinsic)?;
            negative = sign == b'-';
        }

        // Accumulate as a negative number so i32::MIN is representable
        let mut value: i32 = 0;
        let mut digits = 0;
        while let Some(byte) = self.peek_input(intrinsic)? {
            if !byte.is_ascii_digit() {
                break;
            }
            self.read_input(intrinsic)?;
            digits += 1;
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_sub(i32::from(byte - b'0')))
                .ok_or_else(|| self.io_failure(intrinsic, "integer out of range"))?;
        }

        if digits == 0 {
            let message = match self.peek_input(intrinsic)? {
                Some(byte) => format!("expected an integer, found {:?}", byte as char),
                None => "unexpected end of input".to_string(),
            };
            return Err(self.io_failure(intrinsic, message));
        }

        if negative {
            Ok(value)
        } else {
            value
                .checked_neg()
                .ok_or_else(|| self.io_failure(intrinsic, "integer out of range"))
        }
    }

    fn builtin_read_c(&mut self) -> Result<i8, RuntimeError> {
        match self.read_input(Intrinsic::ReadC)? {
            Some(byte) => Ok(byte as i8),
            None => Err(self.io_failure(Intrinsic::ReadC, "unexpected end of input")),
        }
    }

    fn peek_input(&mut self, intrinsic: Intrinsic) -> Result<Option<u8>, RuntimeError> {
        let result = self.terminal.peek_byte();
        result.map_err(|err| self.io_error(intrinsic, err))
    }

    fn read_input(&mut self, intrinsic: Intrinsic) -> Result<Option<u8>, RuntimeError> {
        let result = self.terminal.read_byte();
        result.map_err(|err| self.io_error(intrinsic, err))
    }

    fn write_output(&mut self, intrinsic: Intrinsic, bytes: &[u8]) -> Result<(), RuntimeError> {
        let result = self.terminal.write(bytes);
        result.map_err(|err| self.io_error(intrinsic, err))
    }

    fn io_error(&self, intrinsic: Intrinsic, err: io::Error) -> RuntimeError {
        self.io_failure(intrinsic, err.to_string())
    }

    fn io_failure(&self, intrinsic: Intrinsic, message: impl Into<String>) -> RuntimeError {
        RuntimeError::IntrinsicIoFailure {
            operation: intrinsic.name(),
            message: message.into(),
            location: self.current_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::{Function, Instr, Module};
    use crate::interpreter::{ExecutionLimits, Interpreter, RuntimeError};
    use crate::parser::ast::Type;
    use crate::semantic::Intrinsic;
    use crate::terminal::MemoryTerminal;

    fn module_with(code: Vec<Instr>, strings: Vec<&str>) -> Module {
        Module {
            functions: vec![Function {
                name: "main".to_string(),
                param_count: 0,
                slot_types: Vec::new(),
                return_type: Type::Void,
                code,
                locations: Vec::new(),
            }],
            globals: Vec::new(),
            strings: strings.into_iter().map(String::from).collect(),
            entry: 0,
        }
    }

    fn run(module: &Module, input: &str) -> (Result<(), RuntimeError>, String) {
        let mut interp = Interpreter::new(
            module,
            MemoryTerminal::in_memory(input),
            ExecutionLimits::default(),
        );
        let result = interp.run().map(|_| ());
        (result, interp.terminal().output_text())
    }

    fn echo_int() -> Module {
        module_with(
            vec![
                Instr::CallIntrinsic(Intrinsic::ReadI),
                Instr::CallIntrinsic(Intrinsic::PrintI),
                Instr::ReturnVoid,
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_read_i_skips_whitespace() {
        let (result, output) = run(&echo_int(), "  \n\t42\n");
        assert!(result.is_ok());
        assert_eq!(output, "42");
    }

    #[test]
    fn test_read_i_signs_and_extremes() {
        let (_, output) = run(&echo_int(), "-2147483648");
        assert_eq!(output, "-2147483648");
        let (_, output) = run(&echo_int(), "+17");
        assert_eq!(output, "17");
    }

    #[test]
    fn test_read_i_leaves_trailing_byte() {
        let module = module_with(
            vec![
                Instr::CallIntrinsic(Intrinsic::ReadI),
                Instr::CallIntrinsic(Intrinsic::PrintI),
                Instr::CallIntrinsic(Intrinsic::ReadC),
                Instr::CallIntrinsic(Intrinsic::PrintC),
                Instr::ReturnVoid,
            ],
            Vec::new(),
        );
        let (result, output) = run(&module, "12x");
        assert!(result.is_ok());
        assert_eq!(output, "12x");
    }

    #[test]
    fn test_read_i_failures() {
        for input in ["", "   ", "abc", "-", "2147483648"] {
            let (result, _) = run(&echo_int(), input);
            match result {
                Err(RuntimeError::IntrinsicIoFailure { operation, .. }) => {
                    assert_eq!(operation, "read_i", "input {:?}", input)
                }
                other => panic!("expected read_i failure for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_read_c_at_end_of_input() {
        let module = module_with(
            vec![Instr::CallIntrinsic(Intrinsic::ReadC), Instr::Pop, Instr::ReturnVoid],
            Vec::new(),
        );
        let (result, _) = run(&module, "");
        assert!(matches!(
            result,
            Err(RuntimeError::IntrinsicIoFailure { operation: "read_c", .. })
        ));
    }

    #[test]
    fn test_print_s_and_print_c() {
        let module = module_with(
            vec![
                Instr::PushStr(0),
                Instr::CallIntrinsic(Intrinsic::PrintS),
                Instr::PushChar(b'!' as i8),
                Instr::CallIntrinsic(Intrinsic::PrintC),
                Instr::ReturnVoid,
            ],
            vec!["Enter a number: "],
        );
        let (result, output) = run(&module, "");
        assert!(result.is_ok());
        assert_eq!(output, "Enter a number: !");
    }

    #[test]
    fn test_output_kept_when_run_fails() {
        let module = module_with(
            vec![
                Instr::PushStr(0),
                Instr::CallIntrinsic(Intrinsic::PrintS),
                Instr::CallIntrinsic(Intrinsic::ReadI),
                Instr::Pop,
                Instr::ReturnVoid,
            ],
            vec!["prompt> "],
        );
        let (result, output) = run(&module, "");
        assert!(result.is_err());
        assert_eq!(output, "prompt> ");
    }
}
