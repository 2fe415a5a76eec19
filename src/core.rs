use crate::error::{Error, HostEscapeError, Result, StructuralError};
use crate::evaluator::Interpreter;
use crate::list;
use crate::printer::{self, PrintMode};
use crate::types::{Arity, Object, PrimitiveFn};
use itertools::Itertools;
use std::collections::HashMap;
use std::path::PathBuf;

fn expect_list(name: &'static str, obj: &Object) -> Result<Vec<Object>> {
    list::to_vec(obj).ok_or_else(|| StructuralError::ExpectedList(name, obj.clone()).into())
}

const P: PrimitiveFn = PrimitiveFn {
    name: "p",
    fn_ptr: p_,
    arity: Arity::at_least(0),
};

fn p_(_: &mut Interpreter, args: &[Object]) -> Result {
    for arg in args {
        println!("{}", printer::pr_str(arg, PrintMode::ReadableRepresentation));
    }
    Ok(list::build(args.to_vec()))
}

const PUTS: PrimitiveFn = PrimitiveFn {
    name: "puts",
    fn_ptr: |_, args| {
        let text = args
            .iter()
            .map(|arg| printer::pr_str(arg, PrintMode::Directly))
            .join(" ");
        println!("{}", text);
        Ok(Object::Nil)
    },
    arity: Arity::at_least(0),
};

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: |_, args| Ok(list::cons(args[0].clone(), args[1].clone())),
    arity: Arity::exactly(2),
};

const FIRST: PrimitiveFn = PrimitiveFn {
    name: "first",
    fn_ptr: |_, args| {
        args[0]
            .first()
            .ok_or_else(|| StructuralError::ExpectedList("first", args[0].clone()).into())
    },
    arity: Arity::exactly(1),
};

const REST: PrimitiveFn = PrimitiveFn {
    name: "rest",
    fn_ptr: |_, args| {
        args[0]
            .rest()
            .ok_or_else(|| StructuralError::ExpectedList("rest", args[0].clone()).into())
    },
    arity: Arity::exactly(1),
};

const CONCAT: PrimitiveFn = PrimitiveFn {
    name: "concat",
    fn_ptr: concat_,
    arity: Arity::at_least(0),
};

fn concat_(_: &mut Interpreter, args: &[Object]) -> Result {
    let mut items = Vec::new();
    for arg in args {
        items.extend(expect_list("concat", arg)?);
    }
    Ok(list::build(items))
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: |_, args| Ok(list::build(args.to_vec())),
    arity: Arity::at_least(0),
};

const LIST_TEST: PrimitiveFn = PrimitiveFn {
    name: "list?",
    fn_ptr: |_, args| Ok(Object::Bool(args[0].is_list())),
    arity: Arity::exactly(1),
};

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "empty?",
    fn_ptr: empty_test_,
    arity: Arity::exactly(1),
};

fn empty_test_(_: &mut Interpreter, args: &[Object]) -> Result {
    match &args[0] {
        Object::EmptyList => Ok(Object::Bool(true)),
        Object::List(_) => Ok(Object::Bool(false)),
        Object::String(s) => Ok(Object::Bool(s.is_empty())),
        other => Err(StructuralError::ExpectedList("empty?", other.clone()).into()),
    }
}

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: |_, args| Ok(Object::Bool(args[0] == args[1])),
    arity: Arity::exactly(2),
};

const APPLY: PrimitiveFn = PrimitiveFn {
    name: "apply",
    fn_ptr: apply_,
    arity: Arity::at_least(2),
};

/// `(apply f a b '(c d))` calls `f` with `a b c d`.
fn apply_(interpreter: &mut Interpreter, args: &[Object]) -> Result {
    let (func, middle, last) = match args {
        [func, middle @ .., last] => (func, middle, last),
        _ => unreachable!("apply takes at least two arguments"),
    };
    let mut call_args = middle.to_vec();
    call_args.extend(expect_list("apply", last)?);
    interpreter.apply(func, call_args)
}

const MACROEXPAND_1: PrimitiveFn = PrimitiveFn {
    name: "macroexpand-1",
    fn_ptr: |interpreter, args| interpreter.macroexpand_1(&args[0]),
    arity: Arity::exactly(1),
};

const EVAL: PrimitiveFn = PrimitiveFn {
    name: "eval",
    fn_ptr: |interpreter, args| interpreter.eval_global(&args[0]),
    arity: Arity::exactly(1),
};

const LOAD: PrimitiveFn = PrimitiveFn {
    name: "load",
    fn_ptr: load_,
    arity: Arity::exactly(1),
};

// A leading `~/` is the home directory, as a shell would have it.
fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(relative), Some(home)) => home.join(relative),
        _ => PathBuf::from(path),
    }
}

fn load_(interpreter: &mut Interpreter, args: &[Object]) -> Result {
    match &args[0] {
        Object::String(path) => interpreter.load_file(expand_path(path)),
        other => Err(HostEscapeError::Unsupported {
            operation: "load",
            receiver: other.type_name(),
            argument: None,
        }
        .into()),
    }
}

const EXIT: PrimitiveFn = PrimitiveFn {
    name: "exit",
    fn_ptr: |_, _| Err(Error::Exit),
    arity: Arity::exactly(0),
};

type Namespace = HashMap<&'static str, &'static PrimitiveFn>;
lazy_static! {
    pub static ref CORE: Namespace = {
        let mut map = Namespace::new();
        for func in [
            // Output
            P,
            PUTS,
            // Working with lists
            CONS,
            FIRST,
            REST,
            CONCAT,
            LIST,
            LIST_TEST,
            EMPTY_TEST,
            EQUAL,
            // Evaluation
            APPLY,
            MACROEXPAND_1,
            EVAL,
            LOAD,
            EXIT,
        ].iter() {
            map.insert(func.name, func);
        }
        map
    };
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, StructuralError};
    use crate::evaluator::Interpreter;
    use crate::printer::inspect;

    fn run(interp: &mut Interpreter, text: &str) -> String {
        match interp.eval_str(text) {
            Ok(v) => inspect(&v),
            Err(e) => panic!("{} failed: {}", text, e),
        }
    }

    #[test]
    fn list_primitives() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(cons 1 '(2))"), "(1 2)");
        assert_eq!(run(&mut interp, "(cons 1 2)"), "(1 . 2)");
        assert_eq!(run(&mut interp, "(first '(1 2))"), "1");
        assert_eq!(run(&mut interp, "(rest '(1 2))"), "(2)");
        assert_eq!(run(&mut interp, "(first ())"), "nil");
        assert_eq!(run(&mut interp, "(rest ())"), "()");
        assert_eq!(run(&mut interp, "(concat '(1) () '(2 3))"), "(1 2 3)");
        assert_eq!(run(&mut interp, "(concat)"), "()");
        assert_eq!(run(&mut interp, "(list 1 \"a\" :b)"), "(1 \"a\" :b)");
    }

    #[test]
    fn predicates() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(list? ())"), "true");
        assert_eq!(run(&mut interp, "(list? nil)"), "false");
        assert_eq!(run(&mut interp, "(empty? ())"), "true");
        assert_eq!(run(&mut interp, "(empty? '(1))"), "false");
        assert_eq!(run(&mut interp, "(empty? \"\")"), "true");
        assert_eq!(run(&mut interp, "(= '(1 (2)) (list 1 (list 2)))"), "true");
        assert_eq!(run(&mut interp, "(= nil ())"), "false");
    }

    #[test]
    fn first_of_a_non_list_fails() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(first 1)"),
            Err(Error::Structural(StructuralError::ExpectedList("first", _)))
        ));
    }

    #[test]
    fn apply_spreads_the_last_argument() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(apply list 1 2 '(3 4))"), "(1 2 3 4)");
        assert_eq!(run(&mut interp, "(apply (fn (& xs) xs) '())"), "()");
        assert!(matches!(interp.eval_str("(apply list)"), Err(Error::Arity(_))));
    }

    #[test]
    fn eval_uses_the_global_environment() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def x 5)");
        assert_eq!(run(&mut interp, "((fn (x) (eval 'x)) 1)"), "5");
        assert_eq!(run(&mut interp, "(eval (list 'cons 1 ()))"), "(1)");
    }

    #[test]
    fn p_returns_its_arguments() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(p 1 \"two\")"), "(1 \"two\")");
        assert_eq!(run(&mut interp, "(puts \"hi\" 'there)"), "nil");
    }

    #[test]
    fn exit_unwinds() {
        let mut interp = Interpreter::new();
        assert!(matches!(interp.eval_str("(list 1 (exit))"), Err(Error::Exit)));
    }

    #[test]
    fn load_reports_missing_files() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(load \"/nonexistent/roughcut/file.lisp\")"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(super::expand_path("~/x.lisp"), home.join("x.lisp"));
        }
        assert_eq!(super::expand_path("a/b"), std::path::PathBuf::from("a/b"));
    }
}
