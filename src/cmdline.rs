use crate::evaluator::Interpreter;
use crate::interpreter::{self, Outcome, Style};
use crate::source::{BufReadSource, CharSource};
use linefeed::{DefaultTerminal, Interface, ReadResult};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const PRIMARY_PROMPT: &str = "roughcut> ";
const SECONDARY_PROMPT: &str = "";
const USAGE: &str = "usage: roughcut [--no-prompt | --simple] [--stdlib PATH] [FILE...]";

#[derive(Debug)]
pub enum Error {
    Usage(String),
    Io(io::Error),
    /// Bootstrapping failed; the interpreter never started.
    Bootstrap(PathBuf, crate::error::Error),
    /// A script given on the command line raised an error.
    Script(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "{}\n{}", msg, USAGE),
            Error::Io(e) => write!(f, "{}", e),
            Error::Bootstrap(path, e) => write!(f, "loading {}: {}", path.display(), e),
            Error::Script(path) => write!(f, "{} failed", path.display()),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Line editing and history.
    Interactive,
    /// Prompts on stdout, lines from stdin.
    Simple,
    /// No prompts and no `=> ` marker, for piping a script in.
    NoPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub mode: Mode,
    pub stdlib: PathBuf,
    pub files: Vec<PathBuf>,
}

fn default_stdlib() -> PathBuf {
    if let Some(path) = std::env::var_os("ROUGHCUT_STDLIB") {
        return PathBuf::from(path);
    }
    let local = PathBuf::from("stdlib.lisp");
    if local.exists() {
        local
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("stdlib.lisp")
    }
}

impl Options {
    /// Parses the arguments after the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, Error> {
        let mut options = Options {
            mode: Mode::Interactive,
            stdlib: default_stdlib(),
            files: Vec::new(),
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-prompt" => options.mode = Mode::NoPrompt,
                "--simple" => options.mode = Mode::Simple,
                "--stdlib" => match args.next() {
                    Some(path) => options.stdlib = PathBuf::from(path),
                    None => return Err(Error::Usage(String::from("--stdlib needs a path"))),
                },
                flag if flag.starts_with("--") => {
                    return Err(Error::Usage(format!("unknown option {}", flag)))
                }
                file => options.files.push(PathBuf::from(file)),
            }
        }
        Ok(options)
    }
}

/// Where complete lines come from.
pub trait LineInput {
    /// `Ok(None)` at the end of input.
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct Editor {
    interface: Interface<DefaultTerminal>,
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|mut path| {
        path.push(".roughcut_history");
        path
    })
}

impl Editor {
    pub fn new() -> io::Result<Self> {
        let interface = Interface::new("roughcut")?;
        if let Some(path) = history_path() {
            if let Err(e) = interface.load_history(&path) {
                log::info!("no history loaded from {}: {}", path.display(), e);
            }
        }
        Ok(Self { interface })
    }

    pub fn save_history(&self) -> io::Result<()> {
        match history_path() {
            Some(path) => self.interface.save_history(path),
            None => Ok(()),
        }
    }
}

impl LineInput for Editor {
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.interface.set_prompt(prompt)?;
        match self.interface.read_line()? {
            ReadResult::Eof => Ok(None),
            ReadResult::Signal(sig) => {
                writeln!(self.interface, "Received signal {:?}", sig)?;
                Ok(Some(String::new()))
            }
            ReadResult::Input(line) => {
                self.interface.add_history_unique(line.clone());
                Ok(Some(line))
            }
        }
    }
}

/// Reads lines from `input`, writing each prompt to `output` first.
pub struct Plain<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Plain<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LineInput for Plain<R, W> {
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// A `CharSource` over a `LineInput`. The first line of a form gets the
/// primary prompt and the rest get the secondary one, until `reset_prompt`.
pub struct PromptedSource<L> {
    input: L,
    buffer: VecDeque<char>,
    continuing: bool,
}

impl<L: LineInput> PromptedSource<L> {
    pub fn new(input: L) -> Self {
        Self {
            input,
            buffer: VecDeque::new(),
            continuing: false,
        }
    }

    pub fn reset_prompt(&mut self) {
        self.continuing = false;
    }

    pub fn input(&self) -> &L {
        &self.input
    }
}

impl<L: LineInput> CharSource for PromptedSource<L> {
    fn getc(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.buffer.pop_front() {
                return Some(ch);
            }
            let prompt = match self.continuing {
                true => SECONDARY_PROMPT,
                false => PRIMARY_PROMPT,
            };
            match self.input.next_line(prompt) {
                Ok(Some(line)) => {
                    self.buffer.extend(line.chars());
                    self.buffer.push_back('\n');
                    self.continuing = true;
                }
                Ok(None) => return None,
                Err(e) => {
                    log::warn!("reading input failed: {}", e);
                    return None;
                }
            }
        }
    }

    fn ungetc(&mut self, ch: char) {
        self.buffer.push_front(ch);
    }
}

fn error_style() -> Style {
    Style {
        marker: true,
        colour: atty::is(atty::Stream::Stderr),
    }
}

/// The prompting loop. Unlike `interpreter::run` it returns the prompt to
/// the primary one whenever a form ends at a line boundary.
pub fn repl<L: LineInput>(interpreter: &mut Interpreter, input: L) -> io::Result<PromptedSource<L>> {
    let style = error_style();
    let mut reader = interpreter.reader(PromptedSource::new(input));
    let (stdout, stderr) = (io::stdout(), io::stderr());
    loop {
        let outcome = interpreter::rep(interpreter, &mut reader);
        interpreter::write_outcome(&outcome, style, &mut stdout.lock(), &mut stderr.lock())?;
        match outcome {
            Outcome::Eof => {
                writeln!(stdout.lock())?;
                break;
            }
            Outcome::Exit => break,
            _ => (),
        }
        if reader.at_line_start() {
            reader.source_mut().reset_prompt();
        }
    }
    Ok(reader.into_source())
}

fn run_files(interpreter: &mut Interpreter, files: &[PathBuf]) -> Result<(), Error> {
    for path in files {
        match interpreter.load_file(path) {
            Ok(_) => (),
            Err(crate::error::Error::Exit) => return Ok(()),
            Err(error) => {
                let outcome = Outcome::Failed {
                    error,
                    backtrace: interpreter.backtrace(),
                };
                interpreter.clear_stack();
                interpreter::write_outcome(&outcome, error_style(), &mut io::sink(), &mut io::stderr())?;
                return Err(Error::Script(path.clone()));
            }
        }
    }
    Ok(())
}

pub fn launch(args: Vec<String>) -> Result<(), Error> {
    let options = Options::parse(args.into_iter().skip(1))?;
    log::debug!("{:?}", options);
    let mut interpreter = Interpreter::bootstrap(&options.stdlib)
        .map_err(|e| Error::Bootstrap(options.stdlib.clone(), e))?;

    if !options.files.is_empty() {
        return run_files(&mut interpreter, &options.files);
    }

    let stdin = io::stdin();
    match options.mode {
        Mode::NoPrompt => {
            let mut reader = interpreter.reader(BufReadSource::new(stdin.lock()));
            let style = Style {
                marker: false,
                colour: false,
            };
            interpreter::run(&mut interpreter, &mut reader, style, &mut io::stdout(), &mut io::stderr())?;
        }
        Mode::Simple => {
            repl(&mut interpreter, Plain::new(stdin.lock(), io::stdout()))?;
        }
        Mode::Interactive => {
            let source = repl(&mut interpreter, Editor::new()?)?;
            if let Err(e) = source.input().save_history() {
                log::warn!("could not save history: {}", e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_files() {
        let options = Options::parse(args(&["--no-prompt", "--stdlib", "lib.lisp", "a.lisp", "b.lisp"])).unwrap();
        assert_eq!(options.mode, Mode::NoPrompt);
        assert_eq!(options.stdlib, PathBuf::from("lib.lisp"));
        assert_eq!(options.files, vec![PathBuf::from("a.lisp"), PathBuf::from("b.lisp")]);
        assert_eq!(Options::parse(args(&["--simple"])).unwrap().mode, Mode::Simple);
        assert_eq!(Options::parse(args(&[])).unwrap().mode, Mode::Interactive);
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(matches!(Options::parse(args(&["--stdlib"])), Err(Error::Usage(_))));
        assert!(matches!(Options::parse(args(&["--colour"])), Err(Error::Usage(_))));
    }

    #[test]
    fn prompts_switch_to_secondary_until_reset() {
        let mut output = Vec::new();
        {
            let input = Plain::new("(a\nb)\nc\n".as_bytes(), &mut output);
            let mut source = PromptedSource::new(input);
            let chars: String = std::iter::from_fn(|| source.getc()).take(7).collect();
            assert_eq!(chars, "(a\nb)\nc");
            source.reset_prompt();
            assert_eq!(source.getc(), Some('\n'));
            assert_eq!(source.getc(), None);
        }
        let prompts = String::from_utf8(output).unwrap();
        assert_eq!(prompts, format!("{}{}{}{}", PRIMARY_PROMPT, SECONDARY_PROMPT, SECONDARY_PROMPT, PRIMARY_PROMPT));
    }

    #[test]
    fn ungetc_pushes_back() {
        let mut source = PromptedSource::new(Plain::new("xy\n".as_bytes(), io::sink()));
        assert_eq!(source.getc(), Some('x'));
        source.ungetc('x');
        assert_eq!(source.getc(), Some('x'));
        assert_eq!(source.getc(), Some('y'));
    }
}
