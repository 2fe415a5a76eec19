//! The fixed set of host operations `send` can reach. An operation is looked
//! up by name in `OPERATIONS`; anything not listed there is an
//! `UnknownOperation`, however the name was spelled.

use crate::error::{Error, HostEscapeError, Result};
use crate::evaluator::pretty_print_args;
use crate::list;
use crate::printer::inspect;
use crate::types::{Arity, Int, Object};
use std::cmp::Ordering;
use std::collections::HashMap;

pub struct HostOp {
    pub name: &'static str,
    pub arity: Arity,
    pub op: fn(&Object, &[Object]) -> Result,
}

fn unsupported(operation: &'static str, receiver: &Object, argument: Option<&Object>) -> Error {
    HostEscapeError::Unsupported {
        operation,
        receiver: receiver.type_name(),
        argument: argument.map(Object::type_name),
    }
    .into()
}

enum Numbers {
    Ints(Int, Int),
    Floats(f64, f64),
}

/// Integer pairs stay integers; any float in the pair promotes both.
fn numbers(operation: &'static str, receiver: &Object, argument: &Object) -> Result<Numbers> {
    use Object::{Float, Integer};
    match (receiver, argument) {
        (Integer(x), Integer(y)) => Ok(Numbers::Ints(*x, *y)),
        (Integer(x), Float(y)) => Ok(Numbers::Floats(*x as f64, *y)),
        (Float(x), Integer(y)) => Ok(Numbers::Floats(*x, *y as f64)),
        (Float(x), Float(y)) => Ok(Numbers::Floats(*x, *y)),
        _ => Err(unsupported(operation, receiver, Some(argument))),
    }
}

const ADD: HostOp = HostOp {
    name: "+",
    arity: Arity::exactly(1),
    op: add,
};

fn add(receiver: &Object, args: &[Object]) -> Result {
    let argument = &args[0];
    match (receiver, argument) {
        (Object::String(a), Object::String(b)) => Ok(Object::string(&format!("{}{}", a, b))),
        (a, b) if a.is_list() && b.is_list() => list::to_vec(b)
            .and_then(|_| list::concat(a, b))
            .ok_or_else(|| unsupported("+", a, Some(b))),
        _ => match numbers("+", receiver, argument)? {
            Numbers::Ints(x, y) => x
                .checked_add(y)
                .map(Object::Integer)
                .ok_or_else(|| HostEscapeError::Overflow("+").into()),
            Numbers::Floats(x, y) => Ok(Object::Float(x + y)),
        },
    }
}

macro_rules! arithmetic_operation {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: HostOp = HostOp {
                name: stringify!($SYMBOL),
                arity: Arity::exactly(1),
                op: |receiver, args| match numbers(stringify!($SYMBOL), receiver, &args[0])? {
                    Numbers::Ints(x, y) => x
                        .[<checked_ $NAME:lower>](y)
                        .map(Object::Integer)
                        .ok_or_else(|| Error::from(HostEscapeError::Overflow(stringify!($SYMBOL)))),
                    Numbers::Floats(x, y) => Ok(Object::Float(x $SYMBOL y)),
                },
            };
        }
    };
}

arithmetic_operation!(-, SUB);
arithmetic_operation!(*, MUL);

const DIV: HostOp = HostOp {
    name: "/",
    arity: Arity::exactly(1),
    op: div,
};

// Integer division rounds toward negative infinity.
fn div(receiver: &Object, args: &[Object]) -> Result {
    match numbers("/", receiver, &args[0])? {
        Numbers::Ints(_, 0) => Err(HostEscapeError::DivideByZero.into()),
        Numbers::Ints(x, y) => {
            let quotient = x.checked_div(y).ok_or(HostEscapeError::Overflow("/"))?;
            if x % y != 0 && (x < 0) != (y < 0) {
                Ok(Object::Integer(quotient - 1))
            } else {
                Ok(Object::Integer(quotient))
            }
        }
        Numbers::Floats(x, y) => Ok(Object::Float(x / y)),
    }
}

const MOD: HostOp = HostOp {
    name: "%",
    arity: Arity::exactly(1),
    op: modulo,
};

// The result takes the sign of the divisor.
fn modulo(receiver: &Object, args: &[Object]) -> Result {
    match numbers("%", receiver, &args[0])? {
        Numbers::Ints(_, 0) => Err(HostEscapeError::DivideByZero.into()),
        Numbers::Ints(x, y) => {
            let remainder = x.wrapping_rem(y);
            if remainder != 0 && (remainder < 0) != (y < 0) {
                Ok(Object::Integer(remainder + y))
            } else {
                Ok(Object::Integer(remainder))
            }
        }
        Numbers::Floats(x, y) => {
            let remainder = x % y;
            if remainder != 0.0 && (remainder < 0.0) != (y < 0.0) {
                Ok(Object::Float(remainder + y))
            } else {
                Ok(Object::Float(remainder))
            }
        }
    }
}

fn compare(operation: &'static str, receiver: &Object, argument: &Object) -> Result<Option<Ordering>> {
    match (receiver, argument) {
        (Object::String(a), Object::String(b)) => Ok(Some(a.cmp(b))),
        _ => match numbers(operation, receiver, argument)? {
            Numbers::Ints(x, y) => Ok(Some(x.cmp(&y))),
            Numbers::Floats(x, y) => Ok(x.partial_cmp(&y)),
        },
    }
}

macro_rules! comparison_operation {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: HostOp = HostOp {
                name: stringify!($SYMBOL),
                arity: Arity::exactly(1),
                op: |receiver, args| {
                    compare(stringify!($SYMBOL), receiver, &args[0])
                        .map(|ord| Object::Bool(ord.map_or(false, Ordering::[<is_ $NAME:lower>])))
                },
            };
        }
    };
}

comparison_operation!(<, LT);
comparison_operation!(<=, LE);
comparison_operation!(>, GT);
comparison_operation!(>=, GE);

fn equal(receiver: &Object, argument: &Object) -> bool {
    match numbers("==", receiver, argument) {
        Ok(Numbers::Ints(x, y)) => x == y,
        Ok(Numbers::Floats(x, y)) => x == y,
        Err(_) => receiver == argument,
    }
}

const EQ: HostOp = HostOp {
    name: "==",
    arity: Arity::exactly(1),
    op: |receiver, args| Ok(Object::Bool(equal(receiver, &args[0]))),
};

const NE: HostOp = HostOp {
    name: "!=",
    arity: Arity::exactly(1),
    op: |receiver, args| Ok(Object::Bool(!equal(receiver, &args[0]))),
};

const TO_S: HostOp = HostOp {
    name: "to_s",
    arity: Arity::exactly(0),
    op: |receiver, _| Ok(Object::string(&receiver.to_string())),
};

const INSPECT: HostOp = HostOp {
    name: "inspect",
    arity: Arity::exactly(0),
    op: |receiver, _| Ok(Object::string(&inspect(receiver))),
};

const TO_I: HostOp = HostOp {
    name: "to_i",
    arity: Arity::exactly(0),
    op: to_i,
};

fn to_i(receiver: &Object, _args: &[Object]) -> Result {
    match receiver {
        Object::Nil => Ok(Object::Integer(0)),
        Object::Integer(n) => Ok(Object::Integer(*n)),
        // Truncates; the range check keeps the cast from saturating.
        Object::Float(x) if x.is_finite() && x.abs() < 9.2e18 => Ok(Object::Integer(x.trunc() as Int)),
        Object::Float(x) => Err(HostEscapeError::BadConversion(x.to_string(), "Integer").into()),
        Object::String(s) => s
            .trim()
            .parse::<Int>()
            .map(Object::Integer)
            .map_err(|_| HostEscapeError::BadConversion(s.to_string(), "Integer").into()),
        other => Err(unsupported("to_i", other, None)),
    }
}

const TO_F: HostOp = HostOp {
    name: "to_f",
    arity: Arity::exactly(0),
    op: to_f,
};

fn to_f(receiver: &Object, _args: &[Object]) -> Result {
    match receiver {
        Object::Nil => Ok(Object::Float(0.0)),
        Object::Integer(n) => Ok(Object::Float(*n as f64)),
        Object::Float(x) => Ok(Object::Float(*x)),
        Object::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Object::Float)
            .map_err(|_| HostEscapeError::BadConversion(s.to_string(), "Float").into()),
        other => Err(unsupported("to_f", other, None)),
    }
}

fn length(operation: &'static str, receiver: &Object) -> Result {
    let n = match receiver {
        Object::String(s) => s.chars().count(),
        cells if cells.is_list() => list::to_vec(cells)
            .ok_or_else(|| unsupported(operation, cells, None))?
            .len(),
        other => return Err(unsupported(operation, other, None)),
    };
    Ok(Object::Integer(n as Int))
}

const LENGTH: HostOp = HostOp {
    name: "length",
    arity: Arity::exactly(0),
    op: |receiver, _| length("length", receiver),
};

const SIZE: HostOp = HostOp {
    name: "size",
    arity: Arity::exactly(0),
    op: |receiver, _| length("size", receiver),
};

fn change_case(operation: &'static str, receiver: &Object, upper: bool) -> Result {
    let convert = |s: &str| match upper {
        true => s.to_uppercase(),
        false => s.to_lowercase(),
    };
    match receiver {
        Object::String(s) => Ok(Object::string(&convert(s))),
        Object::Keyword(k) => Ok(Object::keyword(&convert(k))),
        other => Err(unsupported(operation, other, None)),
    }
}

const UPCASE: HostOp = HostOp {
    name: "upcase",
    arity: Arity::exactly(0),
    op: |receiver, _| change_case("upcase", receiver, true),
};

const DOWNCASE: HostOp = HostOp {
    name: "downcase",
    arity: Arity::exactly(0),
    op: |receiver, _| change_case("downcase", receiver, false),
};

const MATCH: HostOp = HostOp {
    name: "=~",
    arity: Arity::exactly(1),
    op: regex_match,
};

/// Character offset of the first match, or `nil`.
fn regex_match(receiver: &Object, args: &[Object]) -> Result {
    let (text, pattern) = match (receiver, &args[0]) {
        (Object::String(s), Object::Regex(r)) | (Object::Regex(r), Object::String(s)) => (s, r),
        (receiver, argument) => return Err(unsupported("=~", receiver, Some(argument))),
    };
    Ok(match pattern.regex.find(text) {
        Some(m) => Object::Integer(text[..m.start()].chars().count() as Int),
        None => Object::Nil,
    })
}

const NIL_TEST: HostOp = HostOp {
    name: "nil?",
    arity: Arity::exactly(0),
    op: |receiver, _| Ok(Object::Bool(receiver.is_nil())),
};

const CLASS: HostOp = HostOp {
    name: "class",
    arity: Arity::exactly(0),
    op: |receiver, _| Ok(Object::string(receiver.type_name())),
};

type Operations = HashMap<&'static str, &'static HostOp>;
lazy_static! {
    static ref OPERATIONS: Operations = {
        let mut map = Operations::new();
        for op in [
            // Arithmetic
            ADD,
            SUB,
            MUL,
            DIV,
            MOD,
            // Comparisons
            LT,
            LE,
            GT,
            GE,
            EQ,
            NE,
            // Conversions
            TO_S,
            INSPECT,
            TO_I,
            TO_F,
            // Strings and lists
            LENGTH,
            SIZE,
            UPCASE,
            DOWNCASE,
            MATCH,
            // Other
            NIL_TEST,
            CLASS,
        ].iter() {
            map.insert(op.name, op);
        }
        map
    };
}

pub fn is_supported(name: &str) -> bool {
    OPERATIONS.contains_key(name)
}

/// Runs the operation called `name` on `receiver`.
pub fn invoke(name: &str, receiver: &Object, args: &[Object]) -> Result {
    let operation = OPERATIONS
        .get(name)
        .ok_or_else(|| HostEscapeError::UnknownOperation(name.to_string()))?;
    operation.arity.validate_for(args.len(), operation.name)?;
    log::trace!(
        "send {} to {} with {}",
        operation.name,
        inspect(receiver),
        pretty_print_args(args)
    );
    (operation.op)(receiver, args)
}
