use std::io::Write;

use crate::scanner::Pos;

/// Sink for diagnostics produced while turning source text into a program
pub trait ErrorReporter {
    fn report(&mut self, pos: Pos, message: &str);
}

// A reporter that renders error messages to the output
pub struct WriteErrorReporter<'w, W>
where
    W: Write,
{
    // Store this as a mut reference so we can't accidentally lose something like stderr().lock() inside the reporter
    // that doesn't go out of scope and cause a deadlock
    write: &'w mut W,
}

impl<'w, W> WriteErrorReporter<'w, W>
where
    W: Write,
{
    pub fn new(write: &'w mut W) -> WriteErrorReporter<'w, W> {
        WriteErrorReporter { write }
    }
}

impl<'w, W> ErrorReporter for WriteErrorReporter<'w, W>
where
    W: Write,
{
    fn report(&mut self, pos: Pos, message: &str) {
        // If the write fails, we don't care
        _ = writeln!(self.write, "error at {}: {}", pos, message);
    }
}

/// Keeps every reported diagnostic, rendered the same way as `WriteErrorReporter`
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub messages: Vec<String>,
}

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, pos: Pos, message: &str) {
        self.messages.push(format!("error at {}: {}", pos, message));
    }
}

/// Track whether or not an error actually occurred and delegate to another error reporter
/// This is only meant to be used by the parser so it can piggy back on whether an error actually occurred
pub(crate) struct StateTrackingReporter<'a, Reporter> {
    pub reporter: &'a mut Reporter,
    pub errored: bool,
}

impl<'a, Reporter> ErrorReporter for StateTrackingReporter<'a, Reporter>
where
    Reporter: ErrorReporter,
{
    fn report(&mut self, pos: Pos, message: &str) {
        self.errored = true;
        self.reporter.report(pos, message);
    }
}
