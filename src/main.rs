use std::io::prelude::*;
use std::io::{stdout, BufReader};
use std::path::Path;
use std::process::ExitCode;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use treelox::ast::Stmt;
use treelox::config::{Config, Settings};
use treelox::interpreter::{stock_interpreter_with, Interpreter, PrintHandler, RuntimeError, Value};
use treelox::parser::parse;
use treelox::reporter::WriteErrorReporter;
use treelox::scanner::Scanner;
use treelox::RunError;

const EXIT_PARSE_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;
const EXIT_IO_ERROR: u8 = 74;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let config = Config::parse();
    tracing::debug!(?config, "starting");

    // The evaluator grows its stack on demand, this only sets the size of the first segment
    let stack_size = config.stack_size_bytes();
    let outcome = thread::Builder::new()
        .name("interpreter".to_string())
        .stack_size(stack_size)
        .spawn(move || run_config(&config))
        .context("unable to start the interpreter thread")
        .and_then(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("the interpreter thread panicked"))?
        });

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("{:#}", error);
            ExitCode::from(EXIT_IO_ERROR)
        }
    }
}

fn run_config(config: &Config) -> Result<u8> {
    match &config.script {
        Some(path) => run_file(path, config.settings()),
        None => {
            run_prompt(config.settings())?;
            Ok(0)
        }
    }
}

fn run_file(path: &Path, settings: Settings) -> Result<u8> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read script file {}", path.display()))?;
    let mut interpreter = stock_interpreter_with(PrintHandler::Stdout, settings);

    let result = {
        let mut stderr = std::io::stderr().lock();
        let mut reporter = WriteErrorReporter::new(&mut stderr);
        treelox::run(&mut interpreter, &mut reporter, &script)
    };

    match result {
        Ok(()) => Ok(0),
        // The reporter has already printed every diagnostic
        Err(RunError::Parse(_)) => Ok(EXIT_PARSE_ERROR),
        Err(RunError::Runtime(error @ RuntimeError::Io(_))) => {
            eprintln!("{}", error);
            Ok(EXIT_IO_ERROR)
        }
        Err(RunError::Runtime(error)) => {
            eprintln!("runtime error: {}", error);
            Ok(EXIT_RUNTIME_ERROR)
        }
    }
}

fn run_prompt(settings: Settings) -> Result<()> {
    let stdin = std::io::stdin().lock();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();
    let mut interpreter = stock_interpreter_with(PrintHandler::Stdout, settings);
    loop {
        {
            let mut stdout = stdout().lock();
            stdout.write_all("> ".as_bytes())?;
            stdout.flush()?;
        }
        let n = reader.read_line(&mut line).context("unable to read from stdin")?;
        if n == 0 {
            break;
        }
        run_line(&mut interpreter, &line);
        // Don't keep appending code until the next time
        line.clear();
    }
    Ok(())
}

// Errors never end the session. A lone expression statement echoes its value unless it is nil.
fn run_line(interpreter: &mut Interpreter, code: &str) {
    let program = {
        let mut stderr = std::io::stderr().lock();
        let mut reporter = WriteErrorReporter::new(&mut stderr);
        match parse(&mut reporter, Scanner::new(code)) {
            Ok(program) => program,
            Err(_) => return,
        }
    };

    let result = match program.0.as_slice() {
        [stmt @ Stmt::Expr(_)] => interpreter.interpret_one(stmt).map(|value| match value {
            Value::Nil => {}
            value => println!("{}", value),
        }),
        stmts => stmts
            .iter()
            .try_for_each(|stmt| interpreter.interpret_one(stmt).map(|_| ())),
    };
    if let Err(error) = result {
        eprintln!("runtime error: {}", error);
    }
}
