use crate::environment::Environment;
use crate::error::{Result, StructuralError};
use crate::evaluator::Interpreter;
use crate::list;
use crate::types::Object;
use std::rc::Rc;

/// What one template element turns into: a single value, or items to be
/// spliced into the enclosing list.
enum Expanded {
    Value(Object),
    Splice(Vec<Object>),
}

/// Builds the datum described by `template`, evaluating every `unquote`
/// and `unquote-splicing` inside it in `env`.
pub fn expand(interpreter: &mut Interpreter, template: &Object, env: &Rc<Environment>) -> Result {
    match expand_element(interpreter, template, env)? {
        Expanded::Value(value) => Ok(value),
        Expanded::Splice(_) => Err(StructuralError::SpliceOutsideList.into()),
    }
}

fn single_operand(form: &'static str, cell_rest: &Object) -> Result<Object> {
    let operands = list::to_vec(cell_rest).ok_or(StructuralError::ImproperForm)?;
    match operands.len() {
        1 => Ok(operands[0].clone()),
        n => Err(StructuralError::UnquoteOperands(form, n).into()),
    }
}

fn expand_element(
    interpreter: &mut Interpreter,
    template: &Object,
    env: &Rc<Environment>,
) -> Result<Expanded> {
    let cell = match template {
        Object::List(cell) => cell,
        other => return Ok(Expanded::Value(other.clone())),
    };

    if let Object::Symbol(head) = &cell.first {
        if *head == interpreter.names.unquote {
            let operand = single_operand("unquote", &cell.rest)?;
            return Ok(Expanded::Value(interpreter.eval(&operand, env)?));
        }
        if *head == interpreter.names.unquote_splicing {
            let operand = single_operand("unquote-splicing", &cell.rest)?;
            let value = interpreter.eval(&operand, env)?;
            let items = list::to_vec(&value).ok_or(StructuralError::SpliceNotAList(value))?;
            return Ok(Expanded::Splice(items));
        }
    }

    let mut items = Vec::new();
    let mut cursor = template.clone();
    loop {
        match cursor {
            Object::List(cell) => {
                match expand_element(interpreter, &cell.first, env)? {
                    Expanded::Value(value) => items.push(value),
                    Expanded::Splice(spliced) => items.extend(spliced),
                }
                cursor = cell.rest.clone();
            }
            Object::EmptyList => return Ok(Expanded::Value(list::build(items))),
            // A dotted tail is kept as written.
            tail => return Ok(Expanded::Value(list::build_dotted(items, tail))),
        }
    }
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
    fn plain_template_is_quoted() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "`(a b c)"), "(a b c)");
        assert_eq!(run(&mut interp, "`sym"), "sym");
        assert_eq!(run(&mut interp, "`()"), "()");
    }

    #[test]
    fn unquote_evaluates_in_place() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def x 2)");
        assert_eq!(run(&mut interp, "`(a ,x (b ,x))"), "(a 2 (b 2))");
        assert_eq!(run(&mut interp, "`,x"), "2");
    }

    #[test]
    fn unquote_splicing_flattens_one_level() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def xs '(1 2))");
        assert_eq!(run(&mut interp, "`(a ,@xs b)"), "(a 1 2 b)");
        assert_eq!(run(&mut interp, "`(,@xs)"), "(1 2)");
        assert_eq!(run(&mut interp, "`(a ,@() b)"), "(a b)");
        assert_eq!(run(&mut interp, "`((,@xs) ,@xs)"), "((1 2) 1 2)");
    }

    #[test]
    fn dotted_templates_keep_their_tail() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(def x 1)");
        assert_eq!(run(&mut interp, "`(,x . y)"), "(1 . y)");
    }

    #[test]
    fn splicing_a_non_list_fails() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("`(a ,@1)"),
            Err(Error::Structural(StructuralError::SpliceNotAList(_)))
        ));
    }

    #[test]
    fn splicing_at_top_level_fails() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("(quasiquote (unquote-splicing (list 1)))"),
            Err(Error::Structural(StructuralError::SpliceOutsideList))
        ));
    }

    #[test]
    fn unquote_takes_one_operand() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.eval_str("`(a (unquote 1 2))"),
            Err(Error::Structural(StructuralError::UnquoteOperands("unquote", 2)))
        ));
    }
}
