//! Persistent singly-linked lists built from cons cells.
//!
//! A list is either `Object::EmptyList` or `Object::List` pointing at a
//! `Cons`. The `rest` of the final cell is normally `EmptyList`; any other
//! value there makes the list dotted.

use crate::types::Object;
use std::rc::Rc;

#[derive(Debug)]
pub struct Cons {
    pub first: Object,
    pub rest: Object,
}

// Unlinks the chain one cell at a time, so dropping a long list does not
// recurse once per element. Stops at the first cell still shared elsewhere.
impl Drop for Cons {
    fn drop(&mut self) {
        let mut rest = std::mem::replace(&mut self.rest, Object::EmptyList);
        while let Object::List(cell) = rest {
            rest = match Rc::try_unwrap(cell) {
                Ok(mut unique) => std::mem::replace(&mut unique.rest, Object::EmptyList),
                Err(_) => break,
            };
        }
    }
}

pub fn cons(first: Object, rest: Object) -> Object {
    Object::List(Rc::new(Cons { first, rest }))
}

/// Builds a proper list; `EmptyList` when `items` is empty.
pub fn build<I>(items: I) -> Object
where
    I: IntoIterator<Item = Object>,
    I::IntoIter: DoubleEndedIterator,
{
    build_dotted(items, Object::EmptyList)
}

pub fn build_dotted<I>(items: I, tail: Object) -> Object
where
    I: IntoIterator<Item = Object>,
    I::IntoIter: DoubleEndedIterator,
{
    items
        .into_iter()
        .rev()
        .fold(tail, |rest, first| cons(first, rest))
}

/// Appends the elements of `b` after the elements of `a`. Returns `None`
/// when `a` is not a proper list.
pub fn concat(a: &Object, b: &Object) -> Option<Object> {
    let front = to_vec(a)?;
    Some(build_dotted(front, b.clone()))
}

/// The elements of a proper list, or `None` for dotted lists and non-lists.
pub fn to_vec(list: &Object) -> Option<Vec<Object>> {
    let mut items = Vec::new();
    let mut cursor = list;
    loop {
        match cursor {
            Object::EmptyList => return Some(items),
            Object::List(cell) => {
                items.push(cell.first.clone());
                cursor = &cell.rest;
            }
            _ => return None,
        }
    }
}

/// Walks the cells of a list. Stops at the terminator, so a dotted tail is
/// never yielded.
pub struct Iter {
    cursor: Object,
}

impl Iterator for Iter {
    type Item = Object;

    fn next(&mut self) -> Option<Object> {
        let (first, rest) = match &self.cursor {
            Object::List(cell) => (cell.first.clone(), cell.rest.clone()),
            _ => return None,
        };
        self.cursor = rest;
        Some(first)
    }
}

impl Object {
    pub fn iter(&self) -> Iter {
        Iter {
            cursor: self.clone(),
        }
    }

    /// `first` of the empty list is `nil`.
    pub fn first(&self) -> Option<Object> {
        match self {
            Object::List(cell) => Some(cell.first.clone()),
            Object::EmptyList => Some(Object::Nil),
            _ => None,
        }
    }

    /// `rest` of the empty list is the empty list.
    pub fn rest(&self) -> Option<Object> {
        match self {
            Object::List(cell) => Some(cell.rest.clone()),
            Object::EmptyList => Some(Object::EmptyList),
            _ => None,
        }
    }

    /// The value after the last cell: `EmptyList` for proper lists.
    pub fn tail(&self) -> Object {
        let mut cursor = self;
        while let Object::List(cell) = cursor {
            cursor = &cell.rest;
        }
        cursor.clone()
    }

    /// True for a two-element list whose head is `symbol`, e.g. `(quote x)`.
    pub(crate) fn is_tagged(&self, symbol: &crate::symbol::Symbol) -> bool {
        match self {
            Object::List(cell) => {
                cell.first.as_symbol() == Some(symbol)
                    && matches!(&cell.rest, Object::List(second) if matches!(second.rest, Object::EmptyList))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(ns: &[i64]) -> Vec<Object> {
        ns.iter().map(|&n| Object::Integer(n)).collect()
    }

    #[test]
    fn build_nothing_is_the_empty_list() {
        assert_eq!(build(vec![]), Object::EmptyList);
    }

    #[test]
    fn build_matches_nested_cons() {
        let expected = cons(
            Object::Integer(1),
            cons(Object::Integer(2), Object::EmptyList),
        );
        assert_eq!(build(ints(&[1, 2])), expected);
    }

    #[test]
    fn rest_of_empty_is_empty() {
        assert_eq!(Object::EmptyList.rest(), Some(Object::EmptyList));
        assert_eq!(Object::EmptyList.first(), Some(Object::Nil));
    }

    #[test]
    fn iteration_restarts_from_the_head() {
        let list = build(ints(&[1, 2, 3]));
        let once: Vec<_> = list.iter().collect();
        let twice: Vec<_> = list.iter().collect();
        assert_eq!(once, ints(&[1, 2, 3]));
        assert_eq!(once, twice);
    }

    #[test]
    fn iteration_skips_dotted_tail() {
        let list = build_dotted(ints(&[1, 2]), Object::Integer(3));
        assert_eq!(list.iter().collect::<Vec<_>>(), ints(&[1, 2]));
        assert_eq!(list.tail(), Object::Integer(3));
        assert_eq!(to_vec(&list), None);
    }

    #[test]
    fn long_lists_drop_without_deep_recursion() {
        let long = build((0..500_000).map(Object::Integer).collect::<Vec<_>>());
        let shared_tail = long.rest().unwrap();
        drop(long);
        assert_eq!(shared_tail.first(), Some(Object::Integer(1)));
        assert_eq!(shared_tail.iter().count(), 499_999);
        drop(shared_tail);
    }

    #[test]
    fn concat_appends() {
        let joined = concat(&build(ints(&[1, 2])), &build(ints(&[3]))).unwrap();
        assert_eq!(joined, build(ints(&[1, 2, 3])));
        assert_eq!(concat(&Object::Integer(1), &Object::EmptyList), None);
    }
}
