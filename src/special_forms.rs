use crate::environment::Environment;
use crate::error::{HostEscapeError, Result, StructuralError};
use crate::evaluator::Interpreter;
use crate::function::{Closure, ClosureKind, ClosureParameters};
use crate::symbol::Symbol;
use crate::types::{truthy, Arity, Object};
use crate::{host, quasiquote};
use std::rc::Rc;

fn target<'a>(form: &'static str, obj: &'a Object) -> Result<&'a Symbol> {
    obj.as_symbol()
        .ok_or_else(|| StructuralError::TargetNotASymbol(form, obj.clone()).into())
}

pub fn apply_quote(args: &[Object]) -> Result {
    Arity::exactly(1).validate_for(args.len(), "quote")?;
    Ok(args[0].clone())
}

pub fn apply_quasiquote(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    Arity::exactly(1).validate_for(args.len(), "quasiquote")?;
    quasiquote::expand(interpreter, &args[0], env)
}

/// `(def name value)`: binds globally and names an unnamed closure.
pub fn apply_def(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    Arity::exactly(2).validate_for(args.len(), "def")?;
    let key = target("def", &args[0])?;
    let value = interpreter.eval(&args[1], env)?;
    if let Object::Closure(closure) = &value {
        closure.set_name(key);
    }
    env.define(key.clone(), value.clone());
    Ok(value)
}

pub fn apply_set(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    Arity::exactly(2).validate_for(args.len(), "set!")?;
    let key = target("set!", &args[0])?;
    let value = interpreter.eval(&args[1], env)?;
    Ok(env.assign(key, value)?)
}

fn make_closure(
    interpreter: &Interpreter,
    kind: ClosureKind,
    form: &'static str,
    args: &[Object],
    env: &Rc<Environment>,
) -> Result {
    // A parameter list, then one or more body expressions.
    let (parameters, body) = match args.split_first() {
        Some((parameters, body)) if !body.is_empty() => (parameters, body),
        _ => return Err(StructuralError::MissingBody(form).into()),
    };
    let parameters = ClosureParameters::new(parameters, &interpreter.names.ampersand)?;
    let closure = Closure::new(kind, parameters, body.to_vec(), env);
    Ok(Object::Closure(Rc::new(closure)))
}

pub fn apply_fn(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    make_closure(interpreter, ClosureKind::Function, "fn", args, env)
}

pub fn apply_macro(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    make_closure(interpreter, ClosureKind::Macro, "macro", args, env)
}

pub fn apply_if(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    Arity::Between(2..=3).validate_for(args.len(), "if")?;
    let condition = interpreter.eval(&args[0], env)?;
    if truthy(&condition) {
        interpreter.eval(&args[1], env)
    } else if args.len() == 3 {
        interpreter.eval(&args[2], env)
    } else {
        Ok(Object::Nil)
    }
}

/// `(send receiver operation args...)`. A bound symbol in receiver position
/// stands for its value; an unbound one is used as the symbol itself.
pub fn apply_send(interpreter: &mut Interpreter, args: &[Object], env: &Rc<Environment>) -> Result {
    Arity::at_least(1).validate_for(args.len(), "send")?;
    let receiver = match &args[0] {
        Object::Symbol(s) => env.get(s).unwrap_or_else(|| args[0].clone()),
        list if list.is_list() => interpreter.eval(list, env)?,
        literal => literal.clone(),
    };
    let (operation, rest) = match args[1..].split_first() {
        Some(split) => split,
        None => return Ok(receiver),
    };

    let operation = interpreter.eval(operation, env)?;
    let name = match &operation {
        Object::Keyword(k) => k.to_string(),
        Object::Symbol(s) => s.to_string(),
        Object::String(s) => s.to_string(),
        other => return Err(HostEscapeError::BadOperationName(other.clone()).into()),
    };
    let args = rest
        .iter()
        .map(|arg| interpreter.eval(arg, env))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    host::invoke(&name, &receiver, &args)
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, HostEscapeError, NameError, StructuralError};
    use crate::evaluator::Interpreter;
    use crate::printer::inspect;

    fn run(interp: &mut Interpreter, text: &str) -> String {
        match interp.eval_str(text) {
            Ok(v) => inspect(&v),
            Err(e) => panic!("{} failed: {}", text, e),
        }
    }

    #[test]
    fn quote_returns_operand_unevaluated() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(quote (a b))"), "(a b)");
        assert_eq!(run(&mut interp, "'sym"), "sym");
        assert!(matches!(interp.eval_str("(quote a b)"), Err(Error::Arity(_))));
    }

    #[test]
    fn def_returns_value_and_names_closures() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(def x 3)"), "3");
        assert_eq!(run(&mut interp, "(def id (fn (x) x))"), "(defn id (x) x)");
        assert_eq!(run(&mut interp, "(def alias id) alias"), "(defn id (x) x)");
        assert_eq!(run(&mut interp, "(def m (macro (x) x))"), "(defmacro m (x) x)");
        assert_eq!(run(&mut interp, "(fn (a & b) b)"), "(fn (a & b) b)");
    }

    #[test]
    fn def_inside_function_writes_global() {
        let mut interp = Interpreter::new();
        run(&mut interp, "((fn (x) (def leaked x)) 5)");
        assert_eq!(run(&mut interp, "leaked"), "5");
    }

    #[test]
    fn def_target_must_be_a_symbol() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(def 1 2)"),
            Err(Error::Structural(StructuralError::TargetNotASymbol("def", _)))
        ));
    }

    #[test]
    fn set_requires_existing_binding() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(set! ghost 1)"),
            Err(Error::Name(NameError::Unassignable(_)))
        ));
        run(&mut interp, "(def x 1)");
        assert_eq!(run(&mut interp, "(set! x 2) x"), "2");
    }

    #[test]
    fn set_on_parameter_does_not_touch_global() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def x 1)");
        assert_eq!(run(&mut interp, "((fn (x) (set! x 10) x) 2)"), "10");
        assert_eq!(run(&mut interp, "x"), "1");
    }

    #[test]
    fn fn_needs_a_body_and_valid_parameters() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(fn (x))"),
            Err(Error::Structural(StructuralError::MissingBody("fn")))
        ));
        assert!(matches!(
            interp.eval_str("(fn (a & b c) a)"),
            Err(Error::Structural(StructuralError::AmpersandPositionNotPenultimate))
        ));
        assert!(matches!(
            interp.eval_str("(fn x x)"),
            Err(Error::Structural(StructuralError::ParametersNotAList(_)))
        ));
    }

    #[test]
    fn if_evaluates_one_branch() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(if true 1 (undefined))"), "1");
        assert_eq!(run(&mut interp, "(if nil (undefined) 2)"), "2");
        assert_eq!(run(&mut interp, "(if false 1)"), "nil");
        assert_eq!(run(&mut interp, "(if () 'empty-is-truthy 'no)"), "empty-is-truthy");
    }

    #[test]
    fn send_resolves_receivers() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def n 41)");
        assert_eq!(run(&mut interp, "(send n :+ 1)"), "42");
        assert_eq!(run(&mut interp, "(send \"abc\" :upcase)"), "\"ABC\"");
        assert_eq!(run(&mut interp, "(send unbound-name :to_s)"), "\"unbound-name\"");
        assert_eq!(run(&mut interp, "(send (cons 1 ()) :length)"), "1");
        assert_eq!(run(&mut interp, "(send n)"), "41");
        assert_eq!(run(&mut interp, "(send 2 '* (send n :- 1))"), "80");
    }

    #[test]
    fn send_rejects_unknown_operations() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(send 1 :instance_eval \"x\")"),
            Err(Error::HostEscape(HostEscapeError::UnknownOperation(_)))
        ));
        interp.clear_stack();
        assert!(matches!(
            interp.eval_str("(send 1 2)"),
            Err(Error::HostEscape(HostEscapeError::BadOperationName(_)))
        ));
    }
}
