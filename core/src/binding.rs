//! Lookup tables from external names to assignable fields.
//!
//! A [`BindingTable`] maps flag strings (`-c`, `--config`) or capture names
//! (`env`) to typed setters on a target value `T`. Fields are registered
//! explicitly with an accessor closure; no reflection is involved.
//!
//! # Example
//!
//! ```
//! use cmdln_core::{BindingTable, FieldKind};
//!
//! #[derive(Default)]
//! struct Opts {
//!     config: Option<String>,
//!     verbose: bool,
//!     include: Vec<String>,
//! }
//!
//! let table = BindingTable::<Opts>::new()
//!     .bind(&["-c", "--config"], |o| &mut o.config)
//!     .with_description("Configuration file")
//!     .bind(&["-v", "--verbose"], |o| &mut o.verbose)
//!     .bind(&["-I", "--include"], |o| &mut o.include);
//!
//! let mut opts = Opts::default();
//! table.get("--config").unwrap().apply(&mut opts, "prod.yaml", None).unwrap();
//! table.get("-v").unwrap().apply(&mut opts, "", None).unwrap();
//! table.get("-I").unwrap().apply(&mut opts, "a", None).unwrap();
//! table.get("--include").unwrap().apply(&mut opts, "b", None).unwrap();
//!
//! assert_eq!(opts.config.as_deref(), Some("prod.yaml"));
//! assert!(opts.verbose);
//! assert_eq!(opts.include, vec!["a", "b"]);
//! assert_eq!(table.get("-c").unwrap().kind(), &FieldKind::String);
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::coerce::{Lookahead, coerce};
use crate::error::CoercionError;
use crate::{Field, FieldKind, Value};

/// Plain string-to-string target used for wildcard binding.
pub type StringTable = HashMap<String, String>;

type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), CoercionError> + Send + Sync>;
type WildcardSetter<T> = Box<dyn Fn(&mut T, &str, &str) + Send + Sync>;

/// One bound field: its external names, kind, and setter.
pub struct Binding<T> {
    names: Vec<String>,
    kind: FieldKind,
    repeated: bool,
    description: Option<String>,
    setter: Setter<T>,
}

impl<T> Binding<T> {
    /// All external names, primary first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The primary external name.
    pub fn primary(&self) -> &str {
        &self.names[0]
    }

    /// Declared coercion kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether repeated occurrences accumulate.
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Optional description, kept for help generators.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Coerces `raw` into the declared kind and stores it into `target`.
    ///
    /// On error the field is left unchanged.
    ///
    /// # Errors
    ///
    /// Any [`CoercionError`] from [`coerce`](crate::coerce) or the setter.
    pub fn apply(
        &self,
        target: &mut T,
        raw: &str,
        lookahead: Option<Lookahead<'_>>,
    ) -> Result<(), CoercionError> {
        let value = coerce(&self.kind, raw, lookahead)?;
        (self.setter)(target, value)
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("names", &self.names)
            .field("kind", &self.kind)
            .field("repeated", &self.repeated)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Name-indexed collection of [`Binding`]s for one target type.
///
/// Tables come in three flavors:
///
/// - [`new`](BindingTable::new): exact-match names, for option flags.
/// - [`arguments`](BindingTable::arguments): case-insensitive names, for
///   route captures.
/// - [`wildcard`](BindingTable::wildcard): no fields at all; every name and
///   value is handed to one setter. For options this switches the tokenizer
///   into wildcard mode.
pub struct BindingTable<T> {
    bindings: Vec<Binding<T>>,
    index: HashMap<String, usize>,
    case_insensitive: bool,
    wildcard: Option<WildcardSetter<T>>,
}

impl<T: 'static> BindingTable<T> {
    /// Creates an empty table with exact-match names.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            index: HashMap::new(),
            case_insensitive: false,
            wildcard: None,
        }
    }

    /// Creates an empty table whose names match case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdln_core::BindingTable;
    ///
    /// #[derive(Default)]
    /// struct Args { env: Option<String> }
    ///
    /// let table = BindingTable::<Args>::arguments().bind(&["Env"], |a| &mut a.env);
    /// assert!(table.get("env").is_some());
    /// assert!(table.get("ENV").is_some());
    /// ```
    pub fn arguments() -> Self {
        Self {
            case_insensitive: true,
            ..Self::new()
        }
    }

    /// Creates a table that hands every name/value pair to `setter`.
    pub fn wildcard(setter: impl Fn(&mut T, &str, &str) + Send + Sync + 'static) -> Self {
        Self {
            wildcard: Some(Box::new(setter)),
            ..Self::new()
        }
    }

    /// Binds a typed field under one or more names.
    ///
    /// The kind and repeated-ness come from the field type `F`. Placeholder
    /// names (`""`, `"-"`, `"--"`) are ignored; if nothing is left the call
    /// is skipped with a warning.
    pub fn bind<F>(self, names: &[&str], accessor: fn(&mut T) -> &mut F) -> Self
    where
        F: Field + 'static,
    {
        self.bind_kind(names, F::kind(), F::repeated(), move |target, value| {
            accessor(target).assign(value)
        })
    }

    /// Binds a setter with an explicitly declared kind.
    ///
    /// The kind is not checked here: an [`FieldKind::Unsupported`] binding
    /// builds fine and fails every time a value is applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdln_core::{BindingTable, CoercionError, FieldKind};
    ///
    /// struct Opts;
    ///
    /// let table = BindingTable::<Opts>::new().bind_kind(
    ///     &["--timeout"],
    ///     FieldKind::Unsupported("duration".into()),
    ///     false,
    ///     |_, _| Ok(()),
    /// );
    /// let err = table.get("--timeout").unwrap().apply(&mut Opts, "5s", None).unwrap_err();
    /// assert!(matches!(err, CoercionError::NotConvertible { .. }));
    /// ```
    pub fn bind_kind(
        mut self,
        names: &[&str],
        kind: FieldKind,
        repeated: bool,
        setter: impl Fn(&mut T, Value) -> Result<(), CoercionError> + Send + Sync + 'static,
    ) -> Self {
        let mut usable: Vec<String> = Vec::with_capacity(names.len());
        for name in names.iter().filter(|n| !matches!(**n, "" | "-" | "--")) {
            let key = self.key(name);
            if usable.iter().any(|u| self.key(u) == key) {
                continue;
            }
            usable.push(name.to_string());
        }
        if usable.is_empty() {
            warn!(names = ?names, kind = %kind, "Binding has no usable name, skipping");
            return self;
        }

        let slot = self.bindings.len();
        for name in &usable {
            let key = self.key(name);
            if let Some(previous) = self.index.insert(key, slot) {
                warn!(
                    name = %name,
                    previous = %self.bindings[previous].primary(),
                    "Name bound twice, keeping the newer binding"
                );
            }
        }
        self.bindings.push(Binding {
            names: usable,
            kind,
            repeated,
            description: None,
            setter: Box::new(setter),
        });
        self
    }

    /// Attaches a description to the most recently added binding.
    pub fn with_description(mut self, description: &str) -> Self {
        if let Some(last) = self.bindings.last_mut() {
            last.description = Some(description.to_string());
        }
        self
    }
}

impl<T> BindingTable<T> {
    /// Looks up the binding for an external name.
    pub fn get(&self, name: &str) -> Option<&Binding<T>> {
        let slot = if self.case_insensitive {
            self.index.get(&name.to_lowercase())
        } else {
            self.index.get(name)
        };
        slot.map(|&i| &self.bindings[i])
    }

    /// Returns `true` if this table captures every name through one setter.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Returns `true` if names match case-insensitively.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Stores a name/value pair through the wildcard setter.
    ///
    /// Returns `false` (and stores nothing) on a non-wildcard table.
    pub fn assign_wildcard(&self, target: &mut T, name: &str, value: &str) -> bool {
        match &self.wildcard {
            Some(setter) => {
                setter(target, name, value);
                true
            }
            None => false,
        }
    }

    /// Iterates over the registered bindings in registration order.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding<T>> {
        self.bindings.iter()
    }

    /// Number of distinct names that resolve to a binding.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no name is bound.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

impl BindingTable<StringTable> {
    /// Wildcard table over a plain string map: every name becomes a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdln_core::{BindingTable, StringTable};
    ///
    /// let table = BindingTable::<StringTable>::string_table();
    /// let mut map = StringTable::new();
    /// assert!(table.assign_wildcard(&mut map, "--mode", "fast"));
    /// assert_eq!(map["--mode"], "fast");
    /// ```
    pub fn string_table() -> Self {
        Self::wildcard(|table: &mut StringTable, name: &str, value: &str| {
            table.insert(name.to_string(), value.to_string());
        })
    }
}

impl<T: 'static> Default for BindingTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BindingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("bindings", &self.bindings)
            .field("case_insensitive", &self.case_insensitive)
            .field("wildcard", &self.wildcard.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Opts {
        aye: Option<isize>,
        bee: Option<f64>,
        sea: Option<String>,
        dei: Option<bool>,
        level: Vec<i32>,
    }

    fn opts_table() -> BindingTable<Opts> {
        BindingTable::<Opts>::new()
            .bind(&["--aye", "-a"], |o| &mut o.aye)
            .with_description("A short description")
            .bind(&["--bee", "-b"], |o| &mut o.bee)
            .bind(&["--sea", "-c"], |o| &mut o.sea)
            .bind(&["--dei", "-d"], |o| &mut o.dei)
            .bind(&["-l"], |o| &mut o.level)
    }

    #[test]
    fn test_every_name_resolves_to_same_binding() {
        let table = opts_table();
        assert_eq!(table.len(), 9);
        assert_eq!(table.get("-a").unwrap().primary(), "--aye");
        assert_eq!(table.get("--aye").unwrap().primary(), "--aye");
        assert_eq!(
            table.get("-a").unwrap().description(),
            Some("A short description")
        );
        assert!(table.get("--AYE").is_none());
    }

    #[test]
    fn test_kinds_follow_field_types() {
        let table = opts_table();
        assert_eq!(table.get("-a").unwrap().kind(), &FieldKind::Int);
        assert_eq!(table.get("-b").unwrap().kind(), &FieldKind::Float);
        assert_eq!(table.get("-c").unwrap().kind(), &FieldKind::String);
        assert_eq!(table.get("-d").unwrap().kind(), &FieldKind::Bool);
        assert!(table.get("-l").unwrap().is_repeated());
        assert!(!table.get("-c").unwrap().is_repeated());
    }

    #[test]
    fn test_placeholder_names_are_dropped() {
        let table = BindingTable::<Opts>::new()
            .bind(&["-", "--noshort"], |o| &mut o.aye)
            .bind(&["-n", "--"], |o| &mut o.sea);
        assert_eq!(table.len(), 2);
        assert!(table.get("-").is_none());
        assert!(table.get("--").is_none());
        assert_eq!(table.get("--noshort").unwrap().names(), ["--noshort"]);
    }

    #[test]
    fn test_unnamed_binding_is_skipped() {
        let table = BindingTable::<Opts>::new().bind(&[], |o| &mut o.aye);
        assert!(table.is_empty());
        assert_eq!(table.bindings().count(), 0);
    }

    #[test]
    fn test_rebinding_replaces_previous() {
        let table = BindingTable::<Opts>::new()
            .bind(&["-x"], |o| &mut o.aye)
            .bind(&["-x"], |o| &mut o.sea);
        let mut opts = Opts::default();
        table.get("-x").unwrap().apply(&mut opts, "hello", None).unwrap();
        assert_eq!(opts.sea.as_deref(), Some("hello"));
        assert_eq!(opts.aye, None);
    }

    #[test]
    fn test_repeated_name_in_one_call_binds_once() {
        #[derive(Default)]
        struct Args {
            env: Option<String>,
        }
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        let (args, opts) = tracing::subscriber::with_default(subscriber, || {
            let args = BindingTable::<Args>::arguments()
                .bind(&["Env", "env", "ENV"], |a| &mut a.env);
            let opts = BindingTable::<Opts>::new()
                .bind(&["-x", "--ex", "-x"], |o| &mut o.aye)
                .bind(&["--ex"], |o| &mut o.sea);
            (args, opts)
        });

        assert_eq!(args.len(), 1);
        assert_eq!(args.get("eNv").unwrap().names(), ["Env"]);
        let mut target = Args::default();
        args.get("env").unwrap().apply(&mut target, "prod", None).unwrap();
        assert_eq!(target.env.as_deref(), Some("prod"));

        assert_eq!(opts.len(), 2);
        assert_eq!(opts.get("-x").unwrap().names(), ["-x", "--ex"]);
        assert_eq!(opts.get("--ex").unwrap().kind(), &FieldKind::String);
    }

    #[test]
    fn test_failed_apply_leaves_field_unset() {
        let table = opts_table();
        let mut opts = Opts::default();
        assert!(table.get("-a").unwrap().apply(&mut opts, "one", None).is_err());
        assert_eq!(opts.aye, None);
    }

    #[test]
    fn test_repeated_apply_accumulates() {
        let table = opts_table();
        let mut opts = Opts::default();
        for v in ["1", "2", "3"] {
            table.get("-l").unwrap().apply(&mut opts, v, None).unwrap();
        }
        assert_eq!(opts.level, vec![1, 2, 3]);
    }

    #[test]
    fn test_argument_table_is_case_insensitive() {
        #[derive(Default)]
        struct Args {
            ample: Option<String>,
        }
        let table = BindingTable::<Args>::arguments().bind(&["Ample"], |a| &mut a.ample);
        assert!(table.is_case_insensitive());
        let mut args = Args::default();
        table.get("AMPLE").unwrap().apply(&mut args, "example", None).unwrap();
        assert_eq!(args.ample.as_deref(), Some("example"));
    }

    #[test]
    fn test_wildcard_table_has_no_bindings() {
        let table = BindingTable::<StringTable>::string_table();
        assert!(table.is_wildcard());
        assert!(table.is_empty());
        assert!(table.get("--anything").is_none());

        let plain = opts_table();
        let mut opts = Opts::default();
        assert!(!plain.assign_wildcard(&mut opts, "-a", "1"));
    }
}
