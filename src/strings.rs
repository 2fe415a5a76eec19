// String literals understand the escapes \\, \", \n and \t; any other
// backslash pair is kept as written. The same table drives both reading and
// inspect-style printing.

use bimap::BiMap;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m.insert('t', '\t');
        m
    };
}

/// Maps the character after a backslash to the character it stands for.
pub(crate) fn unescape(c: char) -> Option<char> {
    ESCAPES.get_by_left(&c).copied()
}

struct StringPrinter<'a> {
    chars: Chars<'a>,
}

impl<'a> StringPrinter<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringPrinter<'_> {
    type Item = (char, Option<char>);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.chars.next()?;
        let charseq = match ESCAPES.get_by_right(&next) {
            Some(&l) => ('\\', Some(l)),
            None => (next, None),
        };
        Some(charseq)
    }
}

pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::with_capacity(src.len() + 2);
    output.push('"');
    for (char1, char2) in StringPrinter::new(src) {
        output.push(char1);
        if let Some(char2) = char2 {
            output.push(char2)
        };
    }
    output.push('"');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_escapes_quotes_and_newlines() {
        assert_eq!(string_repr("say \"hi\"\n"), r#""say \"hi\"\n""#);
    }

    #[test]
    fn unescape_known_and_unknown() {
        assert_eq!(unescape('n'), Some('\n'));
        assert_eq!(unescape('"'), Some('"'));
        assert_eq!(unescape('q'), None);
    }
}
