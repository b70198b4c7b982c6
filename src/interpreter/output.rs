//! Destination for `print` statements.
//!
//! The CLI writes to stdout, tests capture into a buffer so the produced lines can be asserted on.

use std::{
    cell::RefCell,
    io::{self, Write},
};

#[derive(Default)]
pub enum PrintHandler {
    /// Writes each line to stdout
    #[default]
    Stdout,
    /// Captures lines in memory
    Buffer(RefCell<String>),
}

impl PrintHandler {
    pub fn buffer() -> PrintHandler {
        PrintHandler::Buffer(RefCell::new(String::new()))
    }

    pub fn println(&self, msg: &str) -> io::Result<()> {
        match self {
            PrintHandler::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", msg)
            }
            PrintHandler::Buffer(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(msg);
                buffer.push('\n');
                Ok(())
            }
        }
    }

    /// Everything captured so far, always empty for stdout
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Stdout => String::new(),
            PrintHandler::Buffer(buffer) => buffer.borrow().clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffer_collects_lines_in_order() {
        let handler = PrintHandler::buffer();
        handler.println("one").unwrap();
        handler.println("two").unwrap();
        assert_eq!("one\ntwo\n", handler.output());
    }

    #[test]
    fn stdout_captures_nothing() {
        assert_eq!("", PrintHandler::Stdout.output());
    }
}
