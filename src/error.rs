use crate::symbol::Symbol;
use crate::types::{Arity, Object};
use std::fmt;

pub type Result<T = Object> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Read(ReadError),
    Arity(ArityError),
    Name(NameError),
    Structural(StructuralError),
    HostEscape(HostEscapeError),
    Io(std::io::Error),
    /// Unwinds straight to the top-level loop, which stops.
    Exit,
}

impl Error {
    /// The class name printed in front of the message at the REPL.
    pub fn class(&self) -> &'static str {
        match self {
            Error::Read(_) => "ReadError",
            Error::Arity(_) => "ArityError",
            Error::Name(_) => "NameError",
            Error::Structural(_) => "StructuralError",
            Error::HostEscape(_) => "HostEscapeError",
            Error::Io(_) => "IOError",
            Error::Exit => "Exit",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "{}", e),
            Error::Arity(e) => write!(f, "{}", e),
            Error::Name(e) => write!(f, "{}", e),
            Error::Structural(e) => write!(f, "{}", e),
            Error::HostEscape(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
            Error::Exit => write!(f, "exit"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

impl From<ArityError> for Error {
    fn from(e: ArityError) -> Self {
        Self::Arity(e)
    }
}

impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

impl From<StructuralError> for Error {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<HostEscapeError> for Error {
    fn from(e: HostEscapeError) -> Self {
        Self::HostEscape(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    UnexpectedEof(&'static str),
    StrayCloseParen,
    DotOutsidePair,
    BadDottedTail,
    BadNumber(String),
    UnterminatedString,
    UnterminatedRegex,
    UnknownRegexOption(char),
    BadRegex(String),
    EmptyKeyword,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnexpectedEof(context) => write!(f, "reader reached EOF while reading {}", context),
            ReadError::StrayCloseParen => write!(f, "unexpected ')'"),
            ReadError::DotOutsidePair => write!(f, "'.' outside dotted pair"),
            ReadError::BadDottedTail => {
                write!(f, "a dotted pair takes exactly one value after the '.'")
            }
            ReadError::BadNumber(token) => write!(f, "invalid number: {}", token),
            ReadError::UnterminatedString => write!(f, "unterminated string literal"),
            ReadError::UnterminatedRegex => write!(f, "unterminated regular expression"),
            ReadError::UnknownRegexOption(c) => write!(f, "unknown regexp option: {}", c),
            ReadError::BadRegex(msg) => write!(f, "invalid regular expression: {}", msg),
            ReadError::EmptyKeyword => write!(f, "':' must be followed by a name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArityError {
    pub name: String,
    pub expected: Arity,
    pub got: usize,
}

impl fmt::Display for ArityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrong number of arguments to {} ({} for {})",
            self.name, self.got, self.expected
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameError {
    Undefined(Symbol),
    Unassignable(Symbol),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Undefined(s) => write!(f, "{} is undefined", s),
            NameError::Unassignable(s) => write!(f, "Undefined variable '{}'", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuralError {
    TooManyAmpersands(usize),
    AmpersandPositionNotPenultimate,
    ParameterNotASymbol(Object),
    ParametersNotAList(Object),
    MissingBody(&'static str),
    SpliceOutsideList,
    UnquoteOperands(&'static str, usize),
    SpliceNotAList(Object),
    ExpectedList(&'static str, Object),
    ImproperForm,
    NotCallable(Object),
    SpecialFormAsValue(&'static str),
    TargetNotASymbol(&'static str, Object),
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::TooManyAmpersands(n) => {
                write!(f, "found {} '&' markers in an argument list, expected at most one", n)
            }
            StructuralError::AmpersandPositionNotPenultimate => write!(
                f,
                "'&' can only be found in the second to last position of an argument list"
            ),
            StructuralError::ParameterNotASymbol(o) => {
                write!(f, "parameter {} is not a symbol", crate::printer::inspect(o))
            }
            StructuralError::ParametersNotAList(o) => {
                write!(f, "parameters must be a list, got {}", crate::printer::inspect(o))
            }
            StructuralError::MissingBody(form) => write!(f, "{} requires a body", form),
            StructuralError::SpliceOutsideList => {
                write!(f, "unquote-splicing must appear inside a list")
            }
            StructuralError::UnquoteOperands(form, n) => {
                write!(f, "{} expects only one operand, got {}", form, n)
            }
            StructuralError::SpliceNotAList(o) => write!(
                f,
                "unquote-splicing must be used with a list, got {}",
                crate::printer::inspect(o)
            ),
            StructuralError::ExpectedList(name, o) => {
                write!(f, "{} expects a list, got {}", name, crate::printer::inspect(o))
            }
            StructuralError::ImproperForm => write!(f, "cannot evaluate a dotted list"),
            StructuralError::NotCallable(o) => {
                write!(f, "{} is not callable", crate::printer::inspect(o))
            }
            StructuralError::SpecialFormAsValue(name) => {
                write!(f, "special form {} can only be used in operator position", name)
            }
            StructuralError::TargetNotASymbol(form, o) => write!(
                f,
                "{} expects a symbol as its target, got {}",
                form,
                crate::printer::inspect(o)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEscapeError {
    UnknownOperation(String),
    BadOperationName(Object),
    Unsupported {
        operation: &'static str,
        receiver: &'static str,
        argument: Option<&'static str>,
    },
    DivideByZero,
    Overflow(&'static str),
    BadConversion(String, &'static str),
}

impl fmt::Display for HostEscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEscapeError::UnknownOperation(name) => {
                write!(f, "send: no operation named '{}'", name)
            }
            HostEscapeError::BadOperationName(o) => write!(
                f,
                "send: operation name must be a keyword, symbol or string, got {}",
                crate::printer::inspect(o)
            ),
            HostEscapeError::Unsupported {
                operation,
                receiver,
                argument: None,
            } => write!(f, "send: {} does not support '{}'", receiver, operation),
            HostEscapeError::Unsupported {
                operation,
                receiver,
                argument: Some(argument),
            } => write!(
                f,
                "send: {} does not support '{}' with a {} argument",
                receiver, operation, argument
            ),
            HostEscapeError::DivideByZero => write!(f, "divided by 0"),
            HostEscapeError::Overflow(op) => write!(f, "integer overflow in '{}'", op),
            HostEscapeError::BadConversion(text, target) => {
                write!(f, "cannot convert {:?} to {}", text, target)
            }
        }
    }
}
