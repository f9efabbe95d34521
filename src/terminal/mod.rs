//! Program input and output
//!
//! [`Terminal`] pairs the byte source the intrinsics read from with the sink
//! they write to. The CLI wires it to stdin/stdout; tests use
//! [`MemoryTerminal::in_memory`] and inspect the captured output afterwards.
//!
//! Output is flushed before every read so that a prompt is visible before the
//! program blocks on input.

use std::io::{self, BufRead, Cursor, Write};

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

/// Terminal over an in-memory input string and output buffer
pub type MemoryTerminal = Terminal<Cursor<Vec<u8>>, Vec<u8>>;

impl MemoryTerminal {
    pub fn in_memory(input: &str) -> Self {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    /// Everything written so far, decoded lossily
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Terminal { input, output }
    }

    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }

    /// Next input byte without consuming it; `None` at end of input
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        self.flush()?;
        loop {
            match self.input.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Consume and return the next input byte; `None` at end of input
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }

    /// Terminal over borrowed halves, so the owner keeps its buffers
    pub fn by_ref(&mut self) -> Terminal<&mut R, &mut W> {
        Terminal::new(&mut self.input, &mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut terminal = MemoryTerminal::in_memory("ab");
        assert_eq!(terminal.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(terminal.read_byte().unwrap(), Some(b'a'));
        assert_eq!(terminal.read_byte().unwrap(), Some(b'b'));
        assert_eq!(terminal.read_byte().unwrap(), None);
    }

    #[test]
    fn test_output_is_captured() {
        let mut terminal = MemoryTerminal::in_memory("");
        terminal.write(b"(: ").unwrap();
        terminal.write(b"120").unwrap();
        assert_eq!(terminal.output_text(), "(: 120");
    }
}
