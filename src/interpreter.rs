//! One step of the top-level loop, and the loop itself for non-interactive
//! input. Errors never escape a step: they are turned into an `Outcome`
//! carrying the backtrace, and the call stack is cleared.

use crate::error::Error;
use crate::evaluator::Interpreter;
use crate::printer::inspect;
use crate::reader::Reader;
use crate::source::CharSource;
use crate::types::Object;
use ansi_term::Colour::Red;
use std::io::{self, Write};

#[derive(Debug)]
pub enum Outcome {
    Value(Object),
    Failed {
        error: Error,
        backtrace: Vec<String>,
    },
    /// Only whitespace up to the end of the line.
    Blank,
    Eof,
    Exit,
}

fn failed(interpreter: &mut Interpreter, error: Error) -> Outcome {
    let backtrace = interpreter.backtrace();
    interpreter.clear_stack();
    log::debug!("{}: {}", error.class(), error);
    Outcome::Failed { error, backtrace }
}

/// Reads and evaluates one top-level form. A successful result is bound to
/// `_` in the global frame.
pub fn rep<S: CharSource>(interpreter: &mut Interpreter, reader: &mut Reader<S>) -> Outcome {
    if reader.skip_whitespace_through_newline() {
        return Outcome::Blank;
    }
    let datum = match reader.read(false) {
        Ok(Some(datum)) => datum,
        Ok(None) => return Outcome::Eof,
        Err(error) => return failed(interpreter, error),
    };
    match interpreter.eval_global(&datum) {
        Ok(value) => {
            let underscore = interpreter.names.underscore.clone();
            interpreter.global().define(underscore, value.clone());
            Outcome::Value(value)
        }
        Err(Error::Exit) => {
            interpreter.clear_stack();
            Outcome::Exit
        }
        Err(error) => failed(interpreter, error),
    }
}

/// How results and errors are written out.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    /// Print `=> ` before each result.
    pub marker: bool,
    /// Paint errors red.
    pub colour: bool,
}

pub fn write_outcome<O: Write, E: Write>(
    outcome: &Outcome,
    style: Style,
    out: &mut O,
    err: &mut E,
) -> io::Result<()> {
    match outcome {
        Outcome::Value(value) => {
            if style.marker {
                write!(out, "=> ")?;
            }
            writeln!(out, "{}", inspect(value))
        }
        Outcome::Failed { error, backtrace } => {
            let message = format!("{}: {}", error.class(), error);
            if style.colour {
                writeln!(err, "{}", Red.paint(message))?;
            } else {
                writeln!(err, "{}", message)?;
            }
            for line in backtrace {
                writeln!(err, "{}", line)?;
            }
            Ok(())
        }
        Outcome::Blank | Outcome::Eof | Outcome::Exit => Ok(()),
    }
}

/// Runs `rep` until the input ends or `(exit)` is called.
pub fn run<S: CharSource, O: Write, E: Write>(
    interpreter: &mut Interpreter,
    reader: &mut Reader<S>,
    style: Style,
    out: &mut O,
    err: &mut E,
) -> io::Result<()> {
    loop {
        let outcome = rep(interpreter, reader);
        write_outcome(&outcome, style, out, err)?;
        if let Outcome::Eof | Outcome::Exit = outcome {
            return Ok(());
        }
    }
}
