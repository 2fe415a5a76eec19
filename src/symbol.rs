use derive_more::Display;
use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A name canonicalised by an `Interner`. Two symbols from the same interner
/// are equal iff they share the same allocation.
#[derive(Clone, Display)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state)
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "id:{}", self.0)
    }
}

/// Insert-only symbol table. Shared by reference between the reader and the
/// evaluator; it is never cleared.
#[derive(Default)]
pub struct Interner {
    table: RefCell<HashSet<Rc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(existing) = self.table.borrow().get(name) {
            return Symbol(existing.clone());
        }
        let fresh: Rc<str> = Rc::from(name);
        self.table.borrow_mut().insert(fresh.clone());
        log::trace!("interned {}", name);
        Symbol(fresh)
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Quote,
    Quasiquote,
    Def,
    Set,
    Fn,
    Macro,
    If,
    Send,
}

impl SpecialForm {
    pub const ALL: [SpecialForm; 8] = [
        SpecialForm::Quote,
        SpecialForm::Quasiquote,
        SpecialForm::Def,
        SpecialForm::Set,
        SpecialForm::Fn,
        SpecialForm::Macro,
        SpecialForm::If,
        SpecialForm::Send,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Quote => "quote",
            SpecialForm::Quasiquote => "quasiquote",
            SpecialForm::Def => "def",
            SpecialForm::Set => "set!",
            SpecialForm::Fn => "fn",
            SpecialForm::Macro => "macro",
            SpecialForm::If => "if",
            SpecialForm::Send => "send",
        }
    }
}

/// Symbols the reader and evaluator dispatch on, interned once up front.
#[derive(Clone, Debug)]
pub struct Names {
    pub quote: Symbol,
    pub quasiquote: Symbol,
    pub unquote: Symbol,
    pub unquote_splicing: Symbol,
    pub ampersand: Symbol,
    pub underscore: Symbol,
    specials: Vec<(Symbol, SpecialForm)>,
}

impl Names {
    pub fn new(interner: &Interner) -> Self {
        let specials = SpecialForm::ALL
            .iter()
            .map(|&form| (interner.intern(form.name()), form))
            .collect();
        Self {
            quote: interner.intern("quote"),
            quasiquote: interner.intern("quasiquote"),
            unquote: interner.intern("unquote"),
            unquote_splicing: interner.intern("unquote-splicing"),
            ampersand: interner.intern("&"),
            underscore: interner.intern("_"),
            specials,
        }
    }

    pub fn special_form(&self, symbol: &Symbol) -> Option<SpecialForm> {
        self.specials
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|&(_, form)| form)
    }

    pub fn specials(&self) -> impl Iterator<Item = &(Symbol, SpecialForm)> {
        self.specials.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let interner = Interner::new();
        let first = interner.intern("foo");
        let second = interner.intern("foo");
        assert_eq!(first, second);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_names_are_distinct_symbols() {
        let interner = Interner::new();
        assert_ne!(interner.intern("foo"), interner.intern("bar"));
    }

    #[test]
    fn same_name_from_different_tables_is_not_the_same_symbol() {
        let (a, b) = (Interner::new(), Interner::new());
        assert_ne!(a.intern("foo"), b.intern("foo"));
    }

    #[test]
    fn special_forms_resolve_by_identity() {
        let interner = Interner::new();
        let names = Names::new(&interner);
        assert_eq!(
            names.special_form(&interner.intern("set!")),
            Some(SpecialForm::Set)
        );
        assert_eq!(names.special_form(&interner.intern("defn")), None);
    }
}
