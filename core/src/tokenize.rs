//! Splitting raw arguments into option bindings and positional tokens.
//!
//! A [`Tokenizer`] walks the raw token stream once, applies every option it
//! recognizes to the target value, and forwards the rest, in order, as the
//! positional residual. Two strategies are provided:
//!
//! - [`RecordTokenizer`] binds flags through a [`BindingTable`] of typed
//!   fields; unknown flags land in the unhandled table.
//! - [`WildcardTokenizer`] captures every flag into a wildcard table without
//!   knowing flag arity up front.
//!
//! Stages compose through [`TokenizerChain`], each stage consuming the
//! residual of the previous one.

use std::collections::BTreeMap;

use tracing::debug;

use crate::binding::BindingTable;
use crate::coerce::Lookahead;
use crate::error::BindError;

/// Default flag prefix character.
pub const DEFAULT_FLAG_PREFIX: char = '-';

/// Outcome of one tokenizer pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenized {
    /// Tokens that were not consumed as options, in original order.
    pub positional: Vec<String>,
    /// Flags no binding recognized, with their explicit `=value` (or empty).
    pub unhandled: BTreeMap<String, String>,
    /// Coercion failures, in occurrence order.
    pub errors: Vec<BindError>,
}

impl Tokenized {
    fn merge(&mut self, next: Tokenized) {
        self.positional = next.positional;
        self.unhandled.extend(next.unhandled);
        self.errors.extend(next.errors);
    }
}

/// One option-consumption strategy.
pub trait Tokenizer<T> {
    /// Consumes options from `tokens` into `target`.
    fn tokenize(&self, tokens: Vec<String>, target: &mut T) -> Tokenized;
}

/// Returns `true` if `token` starts with the flag prefix.
pub fn is_flag(token: &str, prefix: char) -> bool {
    token.starts_with(prefix)
}

/// Splits a token on its first `=` into key and explicit value.
///
/// The value is empty when there is no `=`.
///
/// # Examples
///
/// ```
/// use cmdln_core::split_key_value;
///
/// assert_eq!(split_key_value("--config=prod.yaml"), ("--config", "prod.yaml"));
/// assert_eq!(split_key_value("--define=a=b"), ("--define", "a=b"));
/// assert_eq!(split_key_value("--verbose"), ("--verbose", ""));
/// ```
pub fn split_key_value(token: &str) -> (&str, &str) {
    token.split_once('=').unwrap_or((token, ""))
}

/// Record-mode tokenizer over a table of typed bindings.
///
/// # Examples
///
/// ```
/// use cmdln_core::{BindingTable, RecordTokenizer, Tokenizer};
///
/// #[derive(Default)]
/// struct Opts { config: Option<String> }
///
/// let table = BindingTable::<Opts>::new().bind(&["-c", "--config"], |o| &mut o.config);
/// let tokenizer = RecordTokenizer::new(table);
///
/// let mut opts = Opts::default();
/// let out = tokenizer.tokenize(vec!["run".into(), "--config=prod.yaml".into()], &mut opts);
/// assert_eq!(out.positional, vec!["run"]);
/// assert_eq!(opts.config.as_deref(), Some("prod.yaml"));
/// ```
#[derive(Debug)]
pub struct RecordTokenizer<T> {
    table: BindingTable<T>,
    flag_prefix: char,
    forward_unknown: bool,
}

impl<T> RecordTokenizer<T> {
    pub fn new(table: BindingTable<T>) -> Self {
        Self::with_prefix(table, DEFAULT_FLAG_PREFIX)
    }

    pub fn with_prefix(table: BindingTable<T>, flag_prefix: char) -> Self {
        Self {
            table,
            flag_prefix,
            forward_unknown: false,
        }
    }

    /// Forwards unknown flags to the residual instead of recording them as
    /// unhandled, so a later chain stage can still bind them.
    pub fn forward_unknown(mut self) -> Self {
        self.forward_unknown = true;
        self
    }

    pub fn table(&self) -> &BindingTable<T> {
        &self.table
    }
}

impl<T> Tokenizer<T> for RecordTokenizer<T> {
    fn tokenize(&self, tokens: Vec<String>, target: &mut T) -> Tokenized {
        let mut out = Tokenized::default();
        let mut pending = tokens.into_iter();

        while let Some(token) = pending.next() {
            let (key, value) = split_key_value(&token);

            if let Some(binding) = self.table.get(key) {
                let rest: Lookahead<'_> = &mut pending;
                if let Err(source) = binding.apply(target, value, Some(rest)) {
                    debug!(flag = %key, error = %source, "Option value rejected");
                    out.errors.push(BindError::new(key, source));
                }
                continue;
            }

            if is_flag(key, self.flag_prefix) && !self.forward_unknown {
                debug!(flag = %key, "Unhandled flag");
                out.unhandled.insert(key.to_string(), value.to_string());
                continue;
            }

            out.positional.push(token);
        }

        out
    }
}

/// Wildcard-mode tokenizer that captures every flag by name.
///
/// A flag with `=value` stores that value. A bare flag takes the next token
/// as its value unless that token is itself a flag, in which case the bare
/// flag gets `"true"` and the next token is evaluated on its own. Anything
/// else is positional.
///
/// # Examples
///
/// ```
/// use cmdln_core::{BindingTable, StringTable, Tokenizer, WildcardTokenizer};
///
/// let tokenizer = WildcardTokenizer::new(BindingTable::<StringTable>::string_table());
/// let mut flags = StringTable::new();
/// let tokens = ["deploy", "--env", "prod", "--force", "--tag=v2", "now"];
/// let out = tokenizer.tokenize(tokens.iter().map(|s| s.to_string()).collect(), &mut flags);
///
/// assert_eq!(out.positional, vec!["deploy", "now"]);
/// assert_eq!(flags["--env"], "prod");
/// assert_eq!(flags["--force"], "true");
/// assert_eq!(flags["--tag"], "v2");
/// ```
#[derive(Debug)]
pub struct WildcardTokenizer<T> {
    table: BindingTable<T>,
    flag_prefix: char,
}

impl<T> WildcardTokenizer<T> {
    pub fn new(table: BindingTable<T>) -> Self {
        Self::with_prefix(table, DEFAULT_FLAG_PREFIX)
    }

    pub fn with_prefix(table: BindingTable<T>, flag_prefix: char) -> Self {
        Self { table, flag_prefix }
    }
}

impl<T> Tokenizer<T> for WildcardTokenizer<T> {
    fn tokenize(&self, tokens: Vec<String>, target: &mut T) -> Tokenized {
        let mut out = Tokenized::default();
        let mut pending = tokens.into_iter().peekable();

        while let Some(token) = pending.next() {
            if !is_flag(&token, self.flag_prefix) {
                out.positional.push(token);
                continue;
            }

            if let Some((key, value)) = token.split_once('=') {
                self.table.assign_wildcard(target, key, value);
                continue;
            }

            let value = match pending.next_if(|next| !is_flag(next, self.flag_prefix)) {
                Some(next) => next,
                None => "true".to_string(),
            };
            self.table.assign_wildcard(target, &token, &value);
        }

        out
    }
}

/// Builds the default single stage for a table: wildcard tables get a
/// [`WildcardTokenizer`], record tables a [`RecordTokenizer`].
pub fn tokenizer_for<T: 'static>(
    table: BindingTable<T>,
    flag_prefix: char,
) -> Box<dyn Tokenizer<T> + Send + Sync> {
    if table.is_wildcard() {
        Box::new(WildcardTokenizer::with_prefix(table, flag_prefix))
    } else {
        Box::new(RecordTokenizer::with_prefix(table, flag_prefix))
    }
}

/// Sequence of tokenizer stages run back to back.
///
/// Each stage sees the previous stage's positional residual. Unhandled
/// tables are merged and errors accumulate across stages. An empty chain
/// forwards every token unchanged.
pub struct TokenizerChain<T> {
    stages: Vec<Box<dyn Tokenizer<T> + Send + Sync>>,
}

impl<T> TokenizerChain<T> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    pub fn push(&mut self, stage: Box<dyn Tokenizer<T> + Send + Sync>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T> Default for TokenizerChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tokenizer<T> for TokenizerChain<T> {
    fn tokenize(&self, tokens: Vec<String>, target: &mut T) -> Tokenized {
        let mut out = Tokenized {
            positional: tokens,
            ..Tokenized::default()
        };
        for stage in &self.stages {
            let next = stage.tokenize(std::mem::take(&mut out.positional), target);
            out.merge(next);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoercionError, StringTable};

    fn toks(line: &str) -> Vec<String> {
        line.split(' ').map(String::from).collect()
    }

    #[derive(Debug, Default)]
    struct Opts {
        aye: Option<isize>,
        bee: Option<f64>,
        sea: Option<String>,
        dei: Option<bool>,
        tag: Vec<String>,
    }

    fn record() -> RecordTokenizer<Opts> {
        RecordTokenizer::new(
            BindingTable::<Opts>::new()
                .bind(&["--aye", "-a"], |o| &mut o.aye)
                .bind(&["--bee", "-b"], |o| &mut o.bee)
                .bind(&["--sea", "-c"], |o| &mut o.sea)
                .bind(&["--dei", "-d"], |o| &mut o.dei)
                .bind(&["-t", "--tag"], |o| &mut o.tag),
        )
    }

    #[test]
    fn test_record_without_flags_is_verbatim() {
        let mut opts = Opts::default();
        let input = toks("example with more than 1");
        let out = record().tokenize(input.clone(), &mut opts);
        assert_eq!(out.positional, input);
        assert!(out.unhandled.is_empty());
        assert!(out.errors.is_empty());
        assert!(opts.aye.is_none() && opts.sea.is_none() && opts.tag.is_empty());
    }

    #[test]
    fn test_record_binds_separate_and_inline_values() {
        let mut opts = Opts::default();
        let mut input = toks("example --aye 1 -b=2.5 --sea");
        input.push("This is a test?".to_string());
        let out = record().tokenize(input, &mut opts);
        assert_eq!(out.positional, vec!["example"]);
        assert_eq!(opts.aye, Some(1));
        assert_eq!(opts.bee, Some(2.5));
        assert_eq!(opts.sea.as_deref(), Some("This is a test?"));
        assert_eq!(opts.dei, None);
    }

    #[test]
    fn test_record_bare_bool_does_not_consume_next() {
        let mut opts = Opts::default();
        let out = record().tokenize(toks("-d deploy"), &mut opts);
        assert_eq!(opts.dei, Some(true));
        assert_eq!(out.positional, vec!["deploy"]);

        let mut opts = Opts::default();
        record().tokenize(toks("--dei=false"), &mut opts);
        assert_eq!(opts.dei, Some(false));

        let mut opts = Opts::default();
        record().tokenize(toks("--dei=yes"), &mut opts);
        assert_eq!(opts.dei, Some(true));
    }

    #[test]
    fn test_record_repeated_and_last_write_wins() {
        let mut opts = Opts::default();
        record().tokenize(toks("-t a --tag=b -c one -t c -c two"), &mut opts);
        assert_eq!(opts.tag, vec!["a", "b", "c"]);
        assert_eq!(opts.sea.as_deref(), Some("two"));
    }

    #[test]
    fn test_record_unknown_flag_is_unhandled() {
        let mut opts = Opts::default();
        let out = record().tokenize(toks("run --force --level=3 target"), &mut opts);
        assert_eq!(out.positional, vec!["run", "target"]);
        assert_eq!(out.unhandled.get("--force").map(String::as_str), Some(""));
        assert_eq!(out.unhandled.get("--level").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_record_coercion_error_continues() {
        let mut opts = Opts::default();
        let out = record().tokenize(toks("--aye=one -c ok run"), &mut opts);
        assert_eq!(opts.aye, None);
        assert_eq!(opts.sea.as_deref(), Some("ok"));
        assert_eq!(out.positional, vec!["run"]);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].name, "--aye");
        assert!(matches!(out.errors[0].source, CoercionError::Invalid { .. }));
    }

    #[test]
    fn test_record_missing_trailing_value() {
        let mut opts = Opts::default();
        let out = record().tokenize(toks("run --sea"), &mut opts);
        assert_eq!(out.positional, vec!["run"]);
        assert_eq!(opts.sea, None);
        assert!(matches!(
            out.errors[0].source,
            CoercionError::MissingValue { .. }
        ));
    }

    #[test]
    fn test_record_custom_prefix() {
        let table = BindingTable::<Opts>::new().bind(&["/v"], |o| &mut o.dei);
        let tokenizer = RecordTokenizer::with_prefix(table, '/');
        let mut opts = Opts::default();
        let out = tokenizer.tokenize(toks("/v /q -x"), &mut opts);
        assert_eq!(opts.dei, Some(true));
        assert!(out.unhandled.contains_key("/q"));
        assert_eq!(out.positional, vec!["-x"]);
    }

    fn wildcard(line: &str) -> (Tokenized, StringTable) {
        let tokenizer = WildcardTokenizer::new(BindingTable::<StringTable>::string_table());
        let mut flags = StringTable::new();
        let out = tokenizer.tokenize(toks(line), &mut flags);
        (out, flags)
    }

    #[test]
    fn test_wildcard_positional_only() {
        let (out, flags) = wildcard("example with more than 1");
        assert_eq!(out.positional, toks("example with more than 1"));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_wildcard_flag_values() {
        let (out, flags) = wildcard("ex•mple -a 1 -b 2 --cdef 3 four");
        assert_eq!(out.positional, vec!["ex•mple", "four"]);
        assert_eq!(flags["-a"], "1");
        assert_eq!(flags["-b"], "2");
        assert_eq!(flags["--cdef"], "3");
    }

    #[test]
    fn test_wildcard_consecutive_flags_are_boolean() {
        let (out, flags) = wildcard("--example --with --only flags");
        assert!(out.positional.is_empty());
        assert_eq!(flags["--example"], "true");
        assert_eq!(flags["--with"], "true");
        assert_eq!(flags["--only"], "flags");
    }

    #[test]
    fn test_wildcard_trailing_flag_and_inline_value() {
        let (out, flags) = wildcard("example --mode=fast -swma");
        assert_eq!(out.positional, vec!["example"]);
        assert_eq!(flags["--mode"], "fast");
        assert_eq!(flags["-swma"], "true");
    }

    #[test]
    fn test_chain_feeds_residual_forward() {
        #[derive(Default)]
        struct Both {
            verbose: bool,
            config: Option<String>,
        }
        let mut chain = TokenizerChain::<Both>::new();
        assert!(chain.is_empty());
        chain.push(Box::new(
            RecordTokenizer::new(BindingTable::new().bind(&["-v"], |b: &mut Both| &mut b.verbose))
                .forward_unknown(),
        ));
        chain.push(Box::new(RecordTokenizer::new(
            BindingTable::new().bind(&["--config"], |b: &mut Both| &mut b.config),
        )));
        assert_eq!(chain.len(), 2);

        let mut both = Both::default();
        let out = chain.tokenize(toks("-v run --config x.yaml --other"), &mut both);
        assert!(both.verbose);
        assert_eq!(both.config.as_deref(), Some("x.yaml"));
        assert_eq!(out.positional, vec!["run"]);
        assert!(out.unhandled.contains_key("--other"));
    }

    #[test]
    fn test_empty_chain_forwards_everything() {
        let chain = TokenizerChain::<Opts>::new();
        let mut opts = Opts::default();
        let out = chain.tokenize(toks("a --b c"), &mut opts);
        assert_eq!(out.positional, toks("a --b c"));
    }
}
