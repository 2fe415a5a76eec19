//! Character sources the reader pulls from.

use std::collections::VecDeque;
use std::io::BufRead;

/// A pushback-capable character stream. `ungetc` only ever receives the
/// character most recently returned by `getc`.
pub trait CharSource {
    fn getc(&mut self) -> Option<char>;
    fn ungetc(&mut self, ch: char);
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn getc(&mut self) -> Option<char> {
        (**self).getc()
    }

    fn ungetc(&mut self, ch: char) {
        (**self).ungetc(ch)
    }
}

/// An in-memory buffer.
pub struct StringSource {
    chars: Vec<char>,
    pos: usize,
}

impl StringSource {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }
}

impl CharSource for StringSource {
    fn getc(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn ungetc(&mut self, ch: char) {
        debug_assert!(self.pos > 0 && self.chars[self.pos - 1] == ch);
        self.pos -= 1;
    }
}

/// Pulls one line at a time from any buffered reader, e.g. locked stdin.
pub struct BufReadSource<R> {
    inner: R,
    buffer: VecDeque<char>,
    exhausted: bool,
}

impl<R: BufRead> BufReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let mut line = String::new();
        match self.inner.read_line(&mut line) {
            Ok(0) => {
                self.exhausted = true;
                false
            }
            Ok(_) => {
                self.buffer.extend(line.chars());
                true
            }
            Err(e) => {
                log::warn!("input stream failed: {}", e);
                self.exhausted = true;
                false
            }
        }
    }
}

impl<R: BufRead> CharSource for BufReadSource<R> {
    fn getc(&mut self) -> Option<char> {
        while self.buffer.is_empty() {
            if !self.fill() {
                return None;
            }
        }
        self.buffer.pop_front()
    }

    fn ungetc(&mut self, ch: char) {
        self.buffer.push_front(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_source_pushback() {
        let mut src = StringSource::new("ab");
        assert_eq!(src.getc(), Some('a'));
        src.ungetc('a');
        assert_eq!(src.getc(), Some('a'));
        assert_eq!(src.getc(), Some('b'));
        assert_eq!(src.getc(), None);
        assert_eq!(src.getc(), None);
    }

    #[test]
    fn bufread_source_spans_lines() {
        let mut src = BufReadSource::new("a\nb".as_bytes());
        let chars: Vec<char> = std::iter::from_fn(|| src.getc()).collect();
        assert_eq!(chars, vec!['a', '\n', 'b']);
    }
}
