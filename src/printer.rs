use crate::list::Cons;
use crate::strings;
use crate::types::Object;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// What `inspect` and the REPL show: strings quoted and escaped,
    /// keywords with their colon.
    ReadableRepresentation,
    /// What `puts` shows.
    Directly,
}

fn quote_prefix(cell: &Cons) -> Option<&'static str> {
    let prefix = match cell.first.as_symbol()?.name() {
        "quote" => "'",
        "quasiquote" => "`",
        "unquote" => ",",
        "unquote-splicing" => ",@",
        _ => return None,
    };
    match &cell.rest {
        Object::List(second) if matches!(second.rest, Object::EmptyList) => Some(prefix),
        _ => None,
    }
}

// List elements are always printed readably, whatever the mode.
fn print_list(cell: &Cons) -> String {
    if let Some(prefix) = quote_prefix(cell) {
        if let Object::List(second) = &cell.rest {
            return format!("{}{}", prefix, inspect(&second.first));
        }
    }
    let mut elements = vec![inspect(&cell.first)];
    let mut cursor = &cell.rest;
    loop {
        match cursor {
            Object::List(next) => {
                elements.push(inspect(&next.first));
                cursor = &next.rest;
            }
            Object::EmptyList => return format!("({})", elements.join(" ")),
            tail => return format!("({} . {})", elements.join(" "), inspect(tail)),
        }
    }
}

pub fn pr_str(object: &Object, mode: PrintMode) -> String {
    let readable = mode == PrintMode::ReadableRepresentation;
    match object {
        Object::Nil => String::from("nil"),
        Object::Bool(b) => b.to_string(),
        Object::Integer(n) => n.to_string(),
        Object::Float(x) => format!("{:?}", x),
        Object::String(s) if readable => strings::string_repr(s),
        Object::String(s) => s.to_string(),
        Object::Symbol(s) => s.to_string(),
        Object::Keyword(k) if readable => format!(":{}", k),
        Object::Keyword(k) => k.to_string(),
        Object::Regex(r) => format!("/{}/{}", r.source, r.options),
        Object::EmptyList => String::from("()"),
        Object::List(cell) => print_list(cell),
        Object::Closure(closure) => closure.to_string(),
        Object::Primitive(func) => format!("#<primitive {}>", func.name),
        Object::Special(form) => format!("#<special-form {}>", form.name()),
    }
}

pub fn inspect(object: &Object) -> String {
    pr_str(object, PrintMode::ReadableRepresentation)
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, PrintMode::Directly))
    }
}
