use crate::environment::{Environment, Frame};
use crate::error::{Result, StructuralError};
use crate::evaluator::{pretty_print_args, Interpreter};
use crate::list;
use crate::symbol::Symbol;
use crate::types::{Arity, Object};
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct ClosureParameters {
    pub positional: Vec<Symbol>,
    pub others: Option<Symbol>,
}

impl fmt::Display for ClosureParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.positional.iter().join(" "))?;
        if let Some(rest) = &self.others {
            if !self.positional.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "& {}", rest)?;
        }
        write!(f, ")")
    }
}

impl ClosureParameters {
    /// Validates a parameter list; `ampersand` is the interned `&` marker.
    pub fn new(parameters: &Object, ampersand: &Symbol) -> std::result::Result<Self, StructuralError> {
        let items = list::to_vec(parameters)
            .ok_or_else(|| StructuralError::ParametersNotAList(parameters.clone()))?;
        let mut symbols = items
            .into_iter()
            .map(|obj| match obj {
                Object::Symbol(s) => Ok(s),
                other => Err(StructuralError::ParameterNotASymbol(other)),
            })
            .collect::<std::result::Result<Vec<Symbol>, _>>()?;

        let ampersand_count = symbols.iter().filter(|&s| s == ampersand).count();
        match ampersand_count {
            0 => Ok(ClosureParameters {
                positional: symbols,
                others: None,
            }),
            1 => {
                let penultimate = symbols.len().checked_sub(2).map(|i| &symbols[i]);
                if penultimate != Some(ampersand) {
                    return Err(StructuralError::AmpersandPositionNotPenultimate);
                }
                let others = symbols.pop();
                let _ampersand = symbols.pop();
                Ok(ClosureParameters {
                    positional: symbols,
                    others,
                })
            }
            n => Err(StructuralError::TooManyAmpersands(n)),
        }
    }

    pub fn arity(&self) -> Arity {
        match self.others {
            None => Arity::exactly(self.positional.len()),
            Some(_) => Arity::at_least(self.positional.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureKind {
    Function,
    Macro,
}

pub struct Closure {
    pub kind: ClosureKind,
    pub parameters: ClosureParameters,
    pub body: Vec<Object>,
    pub parent: Rc<Environment>,
    name: RefCell<Option<Symbol>>,
}

impl Closure {
    pub fn new(
        kind: ClosureKind,
        parameters: ClosureParameters,
        body: Vec<Object>,
        parent: &Rc<Environment>,
    ) -> Self {
        Self {
            kind,
            parameters,
            body,
            parent: parent.clone(),
            name: RefCell::new(None),
        }
    }

    pub fn is_macro(&self) -> bool {
        self.kind == ClosureKind::Macro
    }

    pub fn name(&self) -> Option<Symbol> {
        self.name.borrow().clone()
    }

    /// Names the closure the first time it is called; later calls are
    /// ignored. Returns whether this call set the name.
    pub fn set_name(&self, name: &Symbol) -> bool {
        let mut slot = self.name.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(name.clone());
        true
    }

    fn display_name(&self) -> String {
        match (self.name(), self.kind) {
            (Some(name), _) => name.to_string(),
            (None, ClosureKind::Function) => String::from("fn"),
            (None, ClosureKind::Macro) => String::from("macro"),
        }
    }

    fn bind(&self, args: Vec<Object>) -> Result<Rc<Environment>> {
        self.parameters
            .arity()
            .validate_for(args.len(), &self.display_name())?;

        let mut frame = Frame::default();
        let mut args = args.into_iter();
        for key in self.parameters.positional.iter() {
            if let Some(value) = args.next() {
                frame.insert(key.clone(), value);
            }
        }
        if let Some(rest_key) = &self.parameters.others {
            frame.insert(rest_key.clone(), list::build(args.collect::<Vec<_>>()));
        }
        Ok(Environment::extend(&self.parent, frame))
    }

    /// Evaluates the body with `args` bound. For a macro the result is the
    /// expansion, which the caller evaluates again.
    pub fn invoke(&self, interpreter: &mut Interpreter, args: Vec<Object>) -> Result {
        log::trace!("Call {} with {}", self.display_name(), pretty_print_args(&args));
        let env = self.bind(args)?;
        let mut result = Object::Nil;
        for expr in self.body.iter() {
            result = interpreter.eval(expr, &env)?;
        }
        Ok(result)
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match (self.kind, self.name()) {
            (ClosureKind::Function, None) => String::from("fn"),
            (ClosureKind::Macro, None) => String::from("macro"),
            (ClosureKind::Function, Some(name)) => format!("defn {}", name),
            (ClosureKind::Macro, Some(name)) => format!("defmacro {}", name),
        };
        write!(f, "({} {}", head, self.parameters)?;
        for expr in self.body.iter() {
            write!(f, " {}", crate::printer::inspect(expr))?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{kind: {:?}, parameters: {:?}, body: {:?}, name: {:?}}}",
            self.kind,
            self.parameters,
            self.body,
            self.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Interner;

    fn params(
        text: &str,
        interner: &Rc<Interner>,
    ) -> std::result::Result<ClosureParameters, StructuralError> {
        let parsed = crate::reader::read_str(text, interner).unwrap().unwrap();
        ClosureParameters::new(&parsed, &interner.intern("&"))
    }

    #[test]
    fn fixed_parameters() {
        let interner = Rc::new(Interner::new());
        let p = params("(a b)", &interner).unwrap();
        assert_eq!(p.arity(), Arity::exactly(2));
        assert!(p.others.is_none());
        assert_eq!(p.to_string(), "(a b)");
    }

    #[test]
    fn variadic_parameters() {
        let interner = Rc::new(Interner::new());
        let p = params("(a & rest)", &interner).unwrap();
        assert_eq!(p.arity(), Arity::at_least(1));
        assert_eq!(p.others, Some(interner.intern("rest")));
        assert_eq!(p.to_string(), "(a & rest)");
        assert_eq!(params("(& all)", &interner).unwrap().arity(), Arity::at_least(0));
    }

    #[test]
    fn misplaced_ampersands() {
        let interner = Rc::new(Interner::new());
        assert_eq!(
            params("(a & b c)", &interner).unwrap_err(),
            StructuralError::AmpersandPositionNotPenultimate
        );
        assert_eq!(
            params("(a &)", &interner).unwrap_err(),
            StructuralError::AmpersandPositionNotPenultimate
        );
        assert_eq!(
            params("(& a & b)", &interner).unwrap_err(),
            StructuralError::TooManyAmpersands(2)
        );
        assert_eq!(
            params("(a 1)", &interner).unwrap_err(),
            StructuralError::ParameterNotASymbol(Object::Integer(1))
        );
    }

    #[test]
    fn names_are_write_once() {
        let interner = Rc::new(Interner::new());
        let env = Rc::new(Environment::new());
        let closure = Closure::new(
            ClosureKind::Function,
            params("(x)", &interner).unwrap(),
            vec![Object::Symbol(interner.intern("x"))],
            &env,
        );
        assert_eq!(closure.to_string(), "(fn (x) x)");
        assert!(closure.set_name(&interner.intern("id")));
        assert!(!closure.set_name(&interner.intern("other")));
        assert_eq!(closure.name(), Some(interner.intern("id")));
        assert_eq!(closure.to_string(), "(defn id (x) x)");
    }
}
