use roughcut::printer::inspect;
use roughcut::{Error, Interpreter};

fn bootstrapped() -> Interpreter {
    Interpreter::bootstrap(concat!(env!("CARGO_MANIFEST_DIR"), "/stdlib.lisp"))
        .expect("stdlib should load")
}

fn eval(interp: &mut Interpreter, text: &str) -> String {
    match interp.eval_str(text) {
        Ok(v) => inspect(&v),
        Err(e) => panic!("{} failed: {}", text, e),
    }
}

#[test]
fn defn_and_defmacro_name_what_they_define() {
    let mut interp = bootstrapped();
    assert_eq!(eval(&mut interp, "(defn sq (x) (* x x))"), "(defn sq (x) (* x x))");
    assert_eq!(eval(&mut interp, "(sq 7)"), "49");
    assert_eq!(
        eval(&mut interp, "(defmacro ignore (x) nil)"),
        "(defmacro ignore (x) nil)"
    );
    assert_eq!(eval(&mut interp, "(ignore (launch missiles))"), "nil");
}

#[test]
fn arithmetic_goes_through_send() {
    let mut interp = bootstrapped();
    assert_eq!(eval(&mut interp, "(+ 1 2 3)"), "6");
    assert_eq!(eval(&mut interp, "(- 10 4 3)"), "3");
    assert_eq!(eval(&mut interp, "(- 5)"), "-5");
    assert_eq!(eval(&mut interp, "(* 2 3 7)"), "42");
    assert_eq!(eval(&mut interp, "(/ 7 2)"), "3");
    assert_eq!(eval(&mut interp, "(% 7 2)"), "1");
    assert_eq!(eval(&mut interp, "(+ 1 0.5)"), "1.5");
    assert_eq!(eval(&mut interp, "(+ \"a\" \"b\")"), "\"ab\"");
    assert_eq!(eval(&mut interp, "(< 1 2)"), "true");
    assert_eq!(eval(&mut interp, "(>= 1 2)"), "false");
    assert_eq!(eval(&mut interp, "(== 2 2.0)"), "true");
    assert_eq!(eval(&mut interp, "(inc (dec 5))"), "5");
}

#[test]
fn list_helpers() {
    let mut interp = bootstrapped();
    assert_eq!(eval(&mut interp, "(map inc '(1 2 3))"), "(2 3 4)");
    assert_eq!(eval(&mut interp, "(filter (fn (x) (> x 1)) '(1 2 3))"), "(2 3)");
    assert_eq!(eval(&mut interp, "(reduce + 0 '(1 2 3 4))"), "10");
    assert_eq!(eval(&mut interp, "(reverse '(1 2 3))"), "(3 2 1)");
    assert_eq!(eval(&mut interp, "(second '(1 2 3))"), "2");
    assert_eq!(eval(&mut interp, "(length '(1 2 3))"), "3");
}

#[test]
fn control_macros() {
    let mut interp = bootstrapped();
    assert_eq!(eval(&mut interp, "(let ((x 1) (y 2)) (+ x y))"), "3");
    assert_eq!(eval(&mut interp, "(when true 1 2)"), "2");
    assert_eq!(eval(&mut interp, "(when false (undefined))"), "nil");
    assert_eq!(eval(&mut interp, "(unless false 'ran)"), "ran");
    assert_eq!(eval(&mut interp, "(cond false 1 nil 2 true 3)"), "3");
    assert_eq!(eval(&mut interp, "(cond false 1)"), "nil");
    assert_eq!(eval(&mut interp, "(and 1 2 3)"), "3");
    assert_eq!(eval(&mut interp, "(and 1 nil (undefined))"), "false");
    assert_eq!(eval(&mut interp, "(or nil false 4)"), "4");
    assert_eq!(eval(&mut interp, "(or)"), "nil");
    assert_eq!(eval(&mut interp, "(not nil)"), "true");
    assert_eq!(eval(&mut interp, "(do)"), "nil");
}

#[test]
fn macroexpand_shows_one_step() {
    let mut interp = bootstrapped();
    assert_eq!(
        eval(&mut interp, "(macroexpand-1 '(when c a b))"),
        "(if c (do a b))"
    );
}

#[test]
fn str_joins_to_s_forms() {
    let mut interp = bootstrapped();
    assert_eq!(eval(&mut interp, "(str \"n=\" 1 :k)"), "\"n=1k\"");
}

#[test]
fn host_escape_stays_on_the_allow_list() {
    let mut interp = bootstrapped();
    assert!(matches!(
        interp.eval_str("(send \"ls\" :system)"),
        Err(Error::HostEscape(_))
    ));
}
