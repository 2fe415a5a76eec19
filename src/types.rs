use crate::error::{ArityError, Result};
use crate::evaluator::Interpreter;
use crate::function::Closure;
use crate::list::Cons;
use crate::symbol::{SpecialForm, Symbol};
use regex::Regex;
use std::fmt;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type Int = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &str) -> std::result::Result<(), ArityError> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(ArityError {
                name: name.to_string(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// A builtin bound in the global frame. Receives already-evaluated arguments.
pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&mut Interpreter, &[Object]) -> Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

/// A `/body/opts` or `%r{body}opts` literal.
#[derive(Debug)]
pub struct RegexLiteral {
    pub source: String,
    pub options: String,
    pub regex: Regex,
}

#[derive(Clone)]
pub enum Object {
    Nil,
    Bool(bool),
    Integer(Int),
    Float(f64),
    String(Rc<str>),
    Symbol(Symbol),
    Keyword(Rc<str>),
    Regex(Rc<RegexLiteral>),
    EmptyList,
    List(Rc<Cons>),
    Closure(Rc<Closure>),
    Primitive(&'static PrimitiveFn),
    Special(SpecialForm),
}

pub(crate) fn truthy(obj: &Object) -> bool {
    !matches!(obj, Object::Nil | Object::Bool(false))
}

impl Object {
    pub fn string(s: &str) -> Self {
        Object::String(Rc::from(s))
    }

    pub fn keyword(s: &str) -> Self {
        Object::Keyword(Rc::from(s))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Object::Nil)
    }

    /// True for both list shapes: the empty terminator and a cons cell.
    pub fn is_list(&self) -> bool {
        matches!(self, Object::EmptyList | Object::List(_))
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Object::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// The name used in error messages and by `(send x :class)`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Nil => "Nil",
            Object::Bool(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Float(_) => "Float",
            Object::String(_) => "String",
            Object::Symbol(_) => "Symbol",
            Object::Keyword(_) => "Keyword",
            Object::Regex(_) => "Regexp",
            Object::EmptyList | Object::List(_) => "List",
            Object::Closure(c) if c.is_macro() => "Macro",
            Object::Closure(_) => "Function",
            Object::Primitive(_) => "Primitive",
            Object::Special(_) => "SpecialForm",
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        use Object::*;
        match (self, other) {
            (Nil, Nil) | (EmptyList, EmptyList) => true,
            (Bool(x), Bool(y)) => x == y,
            (Integer(x), Integer(y)) => x == y,
            (Float(x), Float(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Symbol(x), Symbol(y)) => x == y,
            (Keyword(x), Keyword(y)) => x == y,
            (Regex(x), Regex(y)) => x.source == y.source && x.options == y.options,
            (List(x), List(y)) => x.first == y.first && x.rest == y.rest,
            (Closure(x), Closure(y)) => Rc::ptr_eq(x, y),
            (Primitive(x), Primitive(y)) => std::ptr::eq(*x, *y),
            (Special(x), Special(y)) => x == y,
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::printer::inspect(self))
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Bool(b)
    }
}

impl From<Int> for Object {
    fn from(n: Int) -> Self {
        Object::Integer(n)
    }
}

impl From<f64> for Object {
    fn from(x: f64) -> Self {
        Object::Float(x)
    }
}

impl From<Symbol> for Object {
    fn from(s: Symbol) -> Self {
        Object::Symbol(s)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!truthy(&Object::Nil));
        assert!(!truthy(&Object::Bool(false)));
        assert!(truthy(&Object::EmptyList));
        assert!(truthy(&Object::Integer(0)));
        assert!(truthy(&Object::string("")));
    }

    #[test]
    fn arity_bounds() {
        assert!(Arity::exactly(2).contains(2));
        assert!(!Arity::exactly(2).contains(3));
        assert!(Arity::at_least(1).contains(10));
        assert!(!Arity::at_least(1).contains(0));
        let err = Arity::exactly(2).validate_for(3, "f").unwrap_err();
        assert_eq!(err.got, 3);
        assert_eq!(err.to_string(), "wrong number of arguments to f (3 for exactly 2)");
    }

    #[test]
    fn nil_is_not_the_empty_list() {
        assert_ne!(Object::Nil, Object::EmptyList);
    }
}
