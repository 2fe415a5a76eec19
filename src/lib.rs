#[macro_use]
extern crate lazy_static;

pub mod cmdline;
pub mod core;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod host;
pub mod interpreter;
pub mod list;
pub mod printer;
pub mod quasiquote;
pub mod reader;
pub mod source;
pub mod special_forms;
pub mod symbol;
pub mod types;

mod strings;

pub use error::{Error, Result};
pub use evaluator::Interpreter;
pub use types::Object;
