//! Per-invocation dispatch state handed to handlers.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};

use crossbeam_channel::{Receiver, Sender, bounded};
use serde_json::{Map, Value};

use crate::error::{DispatchError, ErrorStack, PromptError};

/// One-shot completion signal.
///
/// Owns the only sender of a zero-capacity channel. Completing takes the
/// sender out and drops it, which disconnects every receiver; a second call
/// finds nothing left to drop.
#[derive(Debug)]
pub(crate) struct Completion {
    sender: Option<Sender<()>>,
}

impl Completion {
    fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = bounded(0);
        (Self { sender: Some(tx) }, rx)
    }

    /// Raises the signal. Returns `false` if it was already raised.
    pub(crate) fn complete(&mut self) -> bool {
        self.sender.take().is_some()
    }

    fn is_complete(&self) -> bool {
        self.sender.is_none()
    }
}

/// State for one invocation: bound values, leftovers, errors, and the
/// helpers a handler may use.
///
/// A context is created fresh by [`Router::parse`](crate::Router::parse) and
/// never reused. It can also be built directly with [`Context::new`], which
/// is handy for exercising a handler in isolation.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use cmdln_router::Context;
///
/// let mut ctx = Context::new((), ());
/// ctx.with_io(Cursor::new("y\n"), Vec::new());
/// assert!(ctx.confirm("Continue?").unwrap());
///
/// ctx.set("attempts", 3);
/// assert_eq!(ctx.get_int("attempts"), Some(3));
/// ```
pub struct Context<O, A> {
    options: O,
    arguments: A,
    unhandled: BTreeMap<String, String>,
    errors: ErrorStack,
    completion: Completion,
    done: Receiver<()>,
    bag: Map<String, Value>,
    raw_args: Vec<String>,
    positional: Vec<String>,
    /// `None` reads through the process-wide stdin buffer.
    input: Option<Box<dyn BufRead + Send>>,
    output: Box<dyn Write + Send>,
}

impl<O, A> Context<O, A> {
    /// Creates a context around the given option and argument values, with
    /// standard input and output as its streams.
    pub fn new(options: O, arguments: A) -> Self {
        let (completion, done) = Completion::new();
        Self {
            options,
            arguments,
            unhandled: BTreeMap::new(),
            errors: ErrorStack::default(),
            completion,
            done,
            bag: Map::new(),
            raw_args: Vec::new(),
            positional: Vec::new(),
            input: None,
            output: Box::new(io::stdout()),
        }
    }

    pub fn options(&self) -> &O {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut O {
        &mut self.options
    }

    pub fn arguments(&self) -> &A {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut A {
        &mut self.arguments
    }

    /// Flags no option binding recognized, with their explicit value.
    pub fn unhandled(&self) -> &BTreeMap<String, String> {
        &self.unhandled
    }

    /// Accumulated errors, or `None` if the invocation had none.
    pub fn error(&self) -> Option<&ErrorStack> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }

    /// The tokens as passed in.
    pub fn raw_args(&self) -> &[String] {
        &self.raw_args
    }

    /// The tokens left after option consumption, root word included.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Receiver for the completion signal.
    ///
    /// The signal is a disconnect: once raised, `recv` returns `Err`
    /// immediately. It is raised before any handler runs and also when no
    /// route is selected.
    pub fn completion(&self) -> Receiver<()> {
        self.done.clone()
    }

    pub fn is_done(&self) -> bool {
        self.completion.is_complete()
    }

    /// Stores a value in the per-invocation bag, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.bag.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Replaces the streams used by [`ask`](Self::ask) and
    /// [`confirm`](Self::confirm).
    pub fn with_io(
        &mut self,
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> &mut Self {
        self.input = Some(Box::new(input));
        self.output = Box::new(output);
        self
    }

    /// Writes `prompt` followed by a space and reads one line.
    ///
    /// The trailing line break is stripped. Blocks until a line or end of
    /// input is available.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from either stream.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Asks a yes/no question.
    ///
    /// `y`, `Y` and `yes` answer `true`; `n`, `N` and `no` answer `false`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::InvalidResponse`] for any other answer, or
    /// [`PromptError::Io`] if a stream fails.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        write!(self.output, "{prompt} [y/n] ")?;
        self.output.flush()?;
        let answer = self.read_line()?;
        match answer.as_str() {
            "y" | "Y" | "yes" => Ok(true),
            "n" | "N" | "no" => Ok(false),
            _ => Err(PromptError::InvalidResponse(answer)),
        }
    }

    /// Consumes the context, returning the bound option and argument values.
    pub fn into_parts(self) -> (O, A) {
        (self.options, self.arguments)
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        match &mut self.input {
            Some(input) => input.read_line(&mut line)?,
            None => io::stdin().read_line(&mut line)?,
        };
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    pub(crate) fn set_tokens(&mut self, raw_args: Vec<String>, positional: Vec<String>) {
        self.raw_args = raw_args;
        self.positional = positional;
    }

    pub(crate) fn set_unhandled(&mut self, unhandled: BTreeMap<String, String>) {
        self.unhandled = unhandled;
    }

    pub(crate) fn push_error(&mut self, error: impl Into<DispatchError>) {
        self.errors.push(error);
    }

    /// Raises the completion signal; later calls are no-ops.
    pub(crate) fn complete(&mut self) {
        self.completion.complete();
    }
}

impl<O: fmt::Debug, A: fmt::Debug> fmt::Debug for Context<O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field("unhandled", &self.unhandled)
            .field("errors", &self.errors)
            .field("done", &self.is_done())
            .field("bag", &self.bag)
            .field("raw_args", &self.raw_args)
            .field("positional", &self.positional)
            .finish_non_exhaustive()
    }
}
