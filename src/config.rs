use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;
pub const DEFAULT_STACK_SIZE_MB: usize = 256;

/// Limits the interpreter enforces while running a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_call_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Script to run, starts a REPL when omitted
    pub script: Option<PathBuf>,

    /// Maximum number of nested calls before the run fails with a stack overflow
    #[arg(long, env = "TREELOX_MAX_CALL_DEPTH", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    pub max_call_depth: usize,

    /// Stack size in MiB of the thread the interpreter runs on
    #[arg(long, env = "TREELOX_STACK_SIZE_MB", default_value_t = DEFAULT_STACK_SIZE_MB)]
    pub stack_size_mb: usize,
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings {
            max_call_depth: self.max_call_depth,
        }
    }

    pub fn stack_size_bytes(&self) -> usize {
        self.stack_size_mb.saturating_mul(1024 * 1024)
    }
}
