use crate::error::{ReadError, Result, StructuralError};
use crate::list;
use crate::source::{CharSource, StringSource};
use crate::strings;
use crate::symbol::{Interner, Names};
use crate::types::{Object, RegexLiteral};
use regex::{Regex, RegexBuilder};
use std::rc::Rc;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").unwrap();
    static ref FLOAT: Regex = Regex::new(
        r"(?x)
        ^[+-]?(0|[1-9][0-9]*)
        (
            \.[0-9]+([eE][+-]?[0-9]+)?  # fraction, optional exponent
            |[eE][+-]?[0-9]+            # or exponent alone
        )$"
    )
    .unwrap();
}

/// What a reader macro produced: a datum, or nothing (a comment) in which
/// case the caller reads again.
enum Step {
    Value(Object),
    Retry,
}

#[derive(Debug, Clone, Copy)]
enum ReaderMacro {
    List,
    String,
    Keyword,
    Quote,
    Quasiquote,
    Unquote,
    Comment,
    Regex,
    PercentLiteral,
}

fn reader_macro(ch: char) -> Option<ReaderMacro> {
    match ch {
        '(' => Some(ReaderMacro::List),
        '"' => Some(ReaderMacro::String),
        ':' => Some(ReaderMacro::Keyword),
        '\'' => Some(ReaderMacro::Quote),
        '`' => Some(ReaderMacro::Quasiquote),
        '~' | ',' => Some(ReaderMacro::Unquote),
        ';' => Some(ReaderMacro::Comment),
        '/' => Some(ReaderMacro::Regex),
        '%' => Some(ReaderMacro::PercentLiteral),
        _ => None,
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '\x0c')
}

fn is_terminator(ch: Option<char>) -> bool {
    match ch {
        None => true,
        Some(c) => is_whitespace(c) || c == ')',
    }
}

/// Turns a character stream into data, one datum per `read`.
pub struct Reader<S> {
    source: S,
    symbols: Rc<Interner>,
    names: Names,
    line_start: bool,
    previous_line_start: bool,
}

impl Reader<StringSource> {
    pub fn from_text(text: &str, symbols: &Rc<Interner>) -> Self {
        Reader::new(StringSource::new(text), symbols)
    }
}

impl<S: CharSource> Reader<S> {
    pub fn new(source: S, symbols: &Rc<Interner>) -> Self {
        Self {
            source,
            names: Names::new(symbols),
            symbols: symbols.clone(),
            line_start: true,
            previous_line_start: true,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// True when nothing on the current line has been consumed yet.
    pub fn at_line_start(&self) -> bool {
        self.line_start
    }

    /// Reads one datum. At the end of input returns `Ok(None)`, or fails
    /// when `should_raise_on_eof` is set.
    pub fn read(&mut self, should_raise_on_eof: bool) -> Result<Option<Object>> {
        loop {
            let ch = match self.skip_whitespace() {
                Some(ch) => ch,
                None if should_raise_on_eof => {
                    return Err(ReadError::UnexpectedEof("a datum").into())
                }
                None => return Ok(None),
            };
            match self.dispatch(ch)? {
                Step::Value(value) => return Ok(Some(value)),
                Step::Retry => continue,
            }
        }
    }

    /// Every remaining top-level datum.
    pub fn read_all(&mut self) -> Result<Vec<Object>> {
        let mut data = Vec::new();
        while let Some(datum) = self.read(false)? {
            data.push(datum);
        }
        Ok(data)
    }

    /// Skips blanks up to and including the next newline. Returns whether a
    /// newline was consumed; stops early (without consuming) at anything else.
    pub fn skip_whitespace_through_newline(&mut self) -> bool {
        loop {
            match self.getc() {
                Some('\n') => return true,
                Some(c) if is_whitespace(c) => continue,
                Some(c) => {
                    self.ungetc(c);
                    return false;
                }
                None => return false,
            }
        }
    }

    fn getc(&mut self) -> Option<char> {
        let ch = self.source.getc();
        self.previous_line_start = self.line_start;
        if let Some(c) = ch {
            self.line_start = c == '\n';
        }
        ch
    }

    fn ungetc(&mut self, ch: char) {
        self.line_start = self.previous_line_start;
        self.source.ungetc(ch)
    }

    fn peek(&mut self) -> Option<char> {
        let ch = self.getc();
        if let Some(c) = ch {
            self.ungetc(c);
        }
        ch
    }

    fn skip_whitespace(&mut self) -> Option<char> {
        loop {
            match self.getc() {
                Some(c) if is_whitespace(c) => continue,
                other => return other,
            }
        }
    }

    /// Reads a datum that must be there, e.g. the operand of `'`.
    fn read_required(&mut self, context: &'static str) -> Result<Object> {
        loop {
            let ch = self
                .skip_whitespace()
                .ok_or(ReadError::UnexpectedEof(context))?;
            if let Step::Value(value) = self.dispatch(ch)? {
                return Ok(value);
            }
        }
    }

    fn dispatch(&mut self, ch: char) -> Result<Step> {
        if ch == ')' {
            return Err(ReadError::StrayCloseParen.into());
        }
        if ch == '.' && is_terminator(self.peek()) {
            return Err(ReadError::DotOutsidePair.into());
        }
        if ch.is_ascii_digit() {
            return self.read_number(ch).map(Step::Value);
        }
        if ch == '+' || ch == '-' {
            if let Some(next) = self.peek() {
                if next.is_ascii_digit() {
                    return self.read_number(ch).map(Step::Value);
                }
            }
        }
        let value = match reader_macro(ch) {
            Some(ReaderMacro::List) => self.read_list()?,
            Some(ReaderMacro::String) => self.read_string()?,
            Some(ReaderMacro::Keyword) => self.read_keyword()?,
            Some(ReaderMacro::Quote) => self.read_wrapped("quote")?,
            Some(ReaderMacro::Quasiquote) => self.read_quasiquote()?,
            Some(ReaderMacro::Unquote) => self.read_unquote()?,
            Some(ReaderMacro::Comment) => {
                self.skip_comment();
                return Ok(Step::Retry);
            }
            Some(ReaderMacro::Regex) => self.read_slash()?,
            Some(ReaderMacro::PercentLiteral) => self.read_percent()?,
            None => {
                let token = self.read_token(ch.to_string());
                self.atom(&token)
            }
        };
        Ok(Step::Value(value))
    }

    /// Collects characters up to whitespace or `)`, starting from `prefix`.
    fn read_token(&mut self, prefix: String) -> String {
        let mut token = prefix;
        while let Some(ch) = self.getc() {
            if is_terminator(Some(ch)) {
                self.ungetc(ch);
                break;
            }
            token.push(ch);
        }
        token
    }

    fn atom(&self, token: &str) -> Object {
        match token {
            "nil" => Object::Nil,
            "true" => Object::Bool(true),
            "false" => Object::Bool(false),
            _ => Object::Symbol(self.symbols.intern(token)),
        }
    }

    fn read_number(&mut self, first: char) -> Result<Object> {
        let token = self.read_token(first.to_string());
        if INTEGER.is_match(&token) {
            token
                .parse()
                .map(Object::Integer)
                .map_err(|_| ReadError::BadNumber(token).into())
        } else if FLOAT.is_match(&token) {
            token
                .parse()
                .map(Object::Float)
                .map_err(|_| ReadError::BadNumber(token).into())
        } else {
            Err(ReadError::BadNumber(token).into())
        }
    }

    fn read_list(&mut self) -> Result<Object> {
        let mut items = Vec::new();
        loop {
            let ch = self
                .skip_whitespace()
                .ok_or(ReadError::UnexpectedEof("a list"))?;
            match ch {
                ')' => return Ok(list::build(items)),
                '.' if self.peek().is_none() => {
                    return Err(ReadError::UnexpectedEof("a dotted pair").into())
                }
                '.' if self.peek().map(is_whitespace).unwrap_or(false) => {
                    if items.is_empty() {
                        return Err(ReadError::DotOutsidePair.into());
                    }
                    let tail = self.read_required("a dotted pair")?;
                    return self.close_dotted(items, tail);
                }
                _ => {
                    if let Step::Value(value) = self.dispatch(ch)? {
                        items.push(value);
                    }
                }
            }
        }
    }

    /// Only `)` may follow the tail of a dotted pair, though comments may
    /// come between.
    fn close_dotted(&mut self, items: Vec<Object>, tail: Object) -> Result<Object> {
        loop {
            match self.skip_whitespace() {
                Some(')') => return Ok(list::build_dotted(items, tail)),
                Some(';') => self.skip_comment(),
                Some(_) => return Err(ReadError::BadDottedTail.into()),
                None => return Err(ReadError::UnexpectedEof("a dotted pair").into()),
            }
        }
    }

    fn read_string(&mut self) -> Result<Object> {
        let mut text = String::new();
        loop {
            match self.getc() {
                None => return Err(ReadError::UnterminatedString.into()),
                Some('"') => return Ok(Object::String(Rc::from(text))),
                Some('\\') => {
                    let escaped = self.getc().ok_or(ReadError::UnterminatedString)?;
                    match strings::unescape(escaped) {
                        Some(ch) => text.push(ch),
                        // Anything else is kept as written, backslash included.
                        None => {
                            text.push('\\');
                            text.push(escaped);
                        }
                    }
                }
                Some(ch) => text.push(ch),
            }
        }
    }

    fn read_keyword(&mut self) -> Result<Object> {
        match self.getc() {
            Some(':') => {
                let token = self.read_token(String::from("::"));
                return Ok(self.atom(&token));
            }
            Some(ch) => self.ungetc(ch),
            None => (),
        }
        let name = self.read_token(String::new());
        if name.is_empty() {
            return Err(ReadError::EmptyKeyword.into());
        }
        Ok(Object::Keyword(Rc::from(name)))
    }

    fn read_wrapped(&mut self, tag: &'static str) -> Result<Object> {
        let symbol = match tag {
            "quote" => self.names.quote.clone(),
            "quasiquote" => self.names.quasiquote.clone(),
            "unquote" => self.names.unquote.clone(),
            _ => self.names.unquote_splicing.clone(),
        };
        let inner = self.read_required(tag)?;
        Ok(list::build(vec![Object::Symbol(symbol), inner]))
    }

    fn read_quasiquote(&mut self) -> Result<Object> {
        let form = self.read_wrapped("quasiquote")?;
        let template = form.rest().and_then(|r| r.first()).unwrap_or(Object::Nil);
        if template.is_tagged(&self.names.unquote_splicing) {
            return Err(StructuralError::SpliceOutsideList.into());
        }
        Ok(form)
    }

    fn read_unquote(&mut self) -> Result<Object> {
        match self.getc() {
            Some('@') => self.read_wrapped("unquote-splicing"),
            Some(ch) => {
                self.ungetc(ch);
                self.read_wrapped("unquote")
            }
            None => Err(ReadError::UnexpectedEof("unquote").into()),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.getc() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn read_slash(&mut self) -> Result<Object> {
        if is_terminator(self.peek()) {
            return Ok(self.atom("/"));
        }
        self.read_regex('/')
    }

    fn read_percent(&mut self) -> Result<Object> {
        match self.getc() {
            Some('r') => match self.getc() {
                Some('{') => self.read_regex('}'),
                Some(ch) => {
                    self.ungetc(ch);
                    let token = self.read_token(String::from("%r"));
                    Ok(self.atom(&token))
                }
                None => Ok(self.atom("%r")),
            },
            Some(ch) => {
                self.ungetc(ch);
                let token = self.read_token(String::from("%"));
                Ok(self.atom(&token))
            }
            None => Ok(self.atom("%")),
        }
    }

    fn read_regex(&mut self, close: char) -> Result<Object> {
        let mut source = String::new();
        loop {
            match self.getc() {
                None => return Err(ReadError::UnterminatedRegex.into()),
                Some('\\') => match self.getc() {
                    None => return Err(ReadError::UnterminatedRegex.into()),
                    Some(c) if c == close => source.push(c),
                    Some(c) => {
                        source.push('\\');
                        source.push(c);
                    }
                },
                Some(c) if c == close => break,
                Some(c) => source.push(c),
            }
        }

        let options = self.read_token(String::new());
        let mut builder = RegexBuilder::new(&source);
        for option in options.chars() {
            match option {
                'i' => builder.case_insensitive(true),
                'x' => builder.ignore_whitespace(true),
                'm' => builder.dot_matches_new_line(true),
                other => return Err(ReadError::UnknownRegexOption(other).into()),
            };
        }
        let regex = builder
            .build()
            .map_err(|e| ReadError::BadRegex(e.to_string()))?;
        Ok(Object::Regex(Rc::new(RegexLiteral {
            source,
            options,
            regex,
        })))
    }
}

/// Reads the first datum of `text`.
pub fn read_str(text: &str, symbols: &Rc<Interner>) -> Result<Option<Object>> {
    Reader::from_text(text, symbols).read(false)
}
