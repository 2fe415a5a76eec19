use crate::environment::Environment;
use crate::error::{Result, StructuralError};
use crate::reader::Reader;
use crate::source::{CharSource, StringSource};
use crate::symbol::{Interner, Names, SpecialForm};
use crate::types::Object;
use crate::{core, list, special_forms};
use itertools::Itertools;
use std::path::Path;
use std::rc::Rc;

pub(crate) fn pretty_print_args(args: &[Object]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => crate::printer::inspect(&args[0]),
        _ => format!("\n\t{}", args.iter().map(crate::printer::inspect).join("\n\t")),
    }
}

/// The evaluator: symbol table, global environment and the diagnostic
/// stack of operators currently being applied.
pub struct Interpreter {
    symbols: Rc<Interner>,
    pub(crate) names: Names,
    global: Rc<Environment>,
    stack: Vec<Object>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with special forms and core primitives bound, but no
    /// standard library loaded.
    pub fn new() -> Self {
        let symbols = Rc::new(Interner::new());
        let names = Names::new(&symbols);
        let global = Rc::new(Environment::new());
        for (symbol, form) in names.specials() {
            global.define(symbol.clone(), Object::Special(*form));
        }
        for (&name, &func) in core::CORE.iter() {
            global.define(symbols.intern(name), Object::Primitive(func));
        }
        Self {
            symbols,
            names,
            global,
            stack: Vec::new(),
        }
    }

    /// `new`, then evaluates every form of the bootstrap file at `path`.
    pub fn bootstrap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut interpreter = Self::new();
        interpreter.load_file(path)?;
        Ok(interpreter)
    }

    pub fn symbols(&self) -> &Rc<Interner> {
        &self.symbols
    }

    pub fn global(&self) -> &Rc<Environment> {
        &self.global
    }

    pub fn reader<S: CharSource>(&self, source: S) -> Reader<S> {
        Reader::new(source, &self.symbols)
    }

    pub fn call_stack(&self) -> &[Object] {
        &self.stack
    }

    /// Operators being applied when the last error was raised, innermost
    /// first.
    pub fn backtrace(&self) -> Vec<String> {
        self.stack
            .iter()
            .rev()
            .map(|func| format!("\tin '{}'", func))
            .collect()
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    pub fn eval_global(&mut self, datum: &Object) -> Result {
        let global = self.global.clone();
        self.eval(datum, &global)
    }

    /// Reads and evaluates every form in `text`, returning the last value.
    pub fn eval_str(&mut self, text: &str) -> Result {
        let mut reader = self.reader(StringSource::new(text));
        let mut result = Object::Nil;
        while let Some(datum) = reader.read(false)? {
            result = self.eval_global(&datum)?;
        }
        Ok(result)
    }

    /// Reads the whole file before evaluating any of it, so a syntax error
    /// anywhere means nothing runs.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result {
        let path = path.as_ref();
        log::info!("loading {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let forms = self.reader(StringSource::new(&text)).read_all()?;
        log::debug!("{} forms in {}", forms.len(), path.display());
        for form in forms.iter() {
            self.eval_global(form)?;
        }
        Ok(Object::Bool(true))
    }

    pub fn eval(&mut self, datum: &Object, env: &Rc<Environment>) -> Result {
        match datum {
            Object::Symbol(symbol) => Ok(env.lookup(symbol)?),
            Object::List(cell) => {
                log::trace!("eval {}", datum);
                let head = &cell.first;
                let operator = self.eval(head, env)?;
                let operands = list::to_vec(&cell.rest).ok_or(StructuralError::ImproperForm)?;

                // Left on the stack if the application fails, for the
                // top-level loop to report.
                self.stack.push(head.clone());
                let result = self.apply_form(head, operator, operands, env)?;
                self.stack.pop();
                Ok(result)
            }
            _ => Ok(datum.clone()),
        }
    }

    fn apply_form(
        &mut self,
        head: &Object,
        operator: Object,
        operands: Vec<Object>,
        env: &Rc<Environment>,
    ) -> Result {
        let special = head
            .as_symbol()
            .and_then(|symbol| self.names.special_form(symbol));
        if let Some(form) = special {
            return match form {
                SpecialForm::Quote => special_forms::apply_quote(&operands),
                SpecialForm::Quasiquote => special_forms::apply_quasiquote(self, &operands, env),
                SpecialForm::Def => special_forms::apply_def(self, &operands, env),
                SpecialForm::Set => special_forms::apply_set(self, &operands, env),
                SpecialForm::Fn => special_forms::apply_fn(self, &operands, env),
                SpecialForm::Macro => special_forms::apply_macro(self, &operands, env),
                SpecialForm::If => special_forms::apply_if(self, &operands, env),
                SpecialForm::Send => special_forms::apply_send(self, &operands, env),
            };
        }

        match &operator {
            Object::Closure(closure) if closure.is_macro() => {
                let expansion = closure.invoke(self, operands)?;
                log::debug!("macro {} expanded to {}", head, expansion);
                self.eval(&expansion, env)
            }
            _ => {
                let args = operands
                    .iter()
                    .map(|operand| self.eval(operand, env))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                self.apply(&operator, args)
            }
        }
    }

    /// Calls a function value on already-evaluated arguments. A macro
    /// called this way returns its expansion unevaluated.
    pub fn apply(&mut self, callable: &Object, args: Vec<Object>) -> Result {
        match callable {
            Object::Closure(closure) => closure.invoke(self, args),
            Object::Primitive(func) => {
                func.arity.validate_for(args.len(), func.name)?;
                log::trace!("Call {} with {}", func.name, pretty_print_args(&args));
                let result = (func.fn_ptr)(self, &args);
                match &result {
                    Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
                    Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
                }
                result
            }
            Object::Special(form) => Err(StructuralError::SpecialFormAsValue(form.name()).into()),
            other => Err(StructuralError::NotCallable(other.clone()).into()),
        }
    }

    /// One expansion step: `form` with its macro applied, or `form` itself
    /// when it is not a macro call.
    pub fn macroexpand_1(&mut self, form: &Object) -> Result {
        let macro_value = match form {
            Object::List(cell) => match &cell.first {
                Object::Closure(c) if c.is_macro() => Some(c.clone()),
                Object::Symbol(s) => self.global.get(s).and_then(|v| match v {
                    Object::Closure(c) if c.is_macro() => Some(c),
                    _ => None,
                }),
                _ => None,
            },
            _ => None,
        };
        match macro_value {
            Some(closure) => {
                let operands = form
                    .rest()
                    .and_then(|rest| list::to_vec(&rest))
                    .ok_or(StructuralError::ImproperForm)?;
                closure.invoke(self, operands)
            }
            None => Ok(form.clone()),
        }
    }
}
