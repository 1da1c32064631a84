//! Field binding, value coercion and option tokenizing.
//!
//! This crate holds the leaf layers of the command-line router:
//!
//! - [`FieldKind`] and [`Value`]: the closed set of field kinds and the
//!   tagged values coercion produces; [`Field`] stores them into Rust
//!   fields (`T`, `Option<T>`, `Vec<T>`).
//! - [`BindingTable`]: explicit name → field registration for option
//!   records and argument records, or a wildcard table for plain string maps.
//! - [`coerce`]: token → typed value conversion with optional lookahead.
//! - [`RecordTokenizer`], [`WildcardTokenizer`] and [`TokenizerChain`]:
//!   option consumption that leaves the positional residual behind.
//!
//! # Example
//!
//! ```
//! use cmdln_core::*;
//!
//! #[derive(Default)]
//! struct Opts {
//!     config: Option<String>,
//!     verbose: bool,
//!     retries: Option<i32>,
//! }
//!
//! let table = BindingTable::<Opts>::new()
//!     .bind(&["-c", "--config"], |o| &mut o.config)
//!     .bind(&["-v", "--verbose"], |o| &mut o.verbose)
//!     .bind(&["--retries"], |o| &mut o.retries);
//!
//! let args: Vec<String> = ["deploy", "-v", "--retries", "3", "--config=prod.yaml", "--dry-run", "staging"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let mut opts = Opts::default();
//! let out = RecordTokenizer::new(table).tokenize(args, &mut opts);
//!
//! assert_eq!(out.positional, vec!["deploy", "staging"]);
//! assert!(out.unhandled.contains_key("--dry-run"));
//! assert!(opts.verbose);
//! assert_eq!(opts.retries, Some(3));
//! assert_eq!(opts.config.as_deref(), Some("prod.yaml"));
//! ```

mod binding;
mod coerce;
mod error;
mod kind;
mod tokenize;

pub use binding::{Binding, BindingTable, StringTable};
pub use coerce::{Lookahead, coerce, parse_bool, unquote};
pub use error::{BindError, CoercionError, Result};
pub use kind::{Field, FieldKind, Value};
pub use tokenize::{
    DEFAULT_FLAG_PREFIX, RecordTokenizer, Tokenized, Tokenizer, TokenizerChain,
    WildcardTokenizer, is_flag, split_key_value, tokenizer_for,
};
