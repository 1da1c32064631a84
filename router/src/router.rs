//! Route registration and dispatch.
//!
//! A [`Router`] is configured once through `&mut` methods and then parses
//! any number of invocations through `&self`. Each call to
//! [`parse`](Router::parse) runs the option tokenizer chain, matches the
//! positional residual against the routes under its root word, binds the
//! winner's captures, and invokes its handler.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use cmdln_core::{
    BindError, BindingTable, RecordTokenizer, Tokenized, Tokenizer, TokenizerChain, tokenizer_for,
};
use tracing::{debug, warn};

use crate::config::RouterConfig;
use crate::context::Context;
use crate::error::{DispatchError, Result};
use crate::matcher::{Arbitration, Capture, arbitrate, match_all};
use crate::pattern::Pattern;
use crate::table::{Route, RouteTable};

type Handler<O, A> = Box<dyn Fn(&mut Context<O, A>) + Send + Sync>;
type PanicHook<O, A> = Box<dyn Fn(&mut Context<O, A>, Box<dyn Any + Send>) + Send + Sync>;

/// Command-line router over an option type `O` and an argument type `A`.
///
/// # Examples
///
/// ```
/// use cmdln_core::BindingTable;
/// use cmdln_router::Router;
///
/// #[derive(Default)]
/// struct Opts { config: Option<String> }
///
/// #[derive(Default)]
/// struct Args { env: Option<String> }
///
/// let mut router = Router::<Opts, Args>::new();
/// router
///     .options(BindingTable::<Opts>::new().bind(&["-c", "--config"], |o| &mut o.config))
///     .arguments(BindingTable::<Args>::arguments().bind(&["env"], |a| &mut a.env));
/// router
///     .handle("deploy :env", |ctx| ctx.set("deployed", true))
///     .unwrap();
///
/// let ctx = router.parse(["deploy", "--config=prod.yaml", "staging"]);
/// assert!(ctx.error().is_none());
/// assert_eq!(ctx.get_bool("deployed"), Some(true));
/// assert_eq!(ctx.options().config.as_deref(), Some("prod.yaml"));
/// assert_eq!(ctx.arguments().env.as_deref(), Some("staging"));
/// ```
pub struct Router<O, A> {
    config: RouterConfig,
    table: RouteTable<Handler<O, A>>,
    options: TokenizerChain<O>,
    arguments: BindingTable<A>,
    not_found: Option<Handler<O, A>>,
    on_unhandled: Option<Handler<O, A>>,
    on_done: Option<Handler<O, A>>,
    on_panic: Option<PanicHook<O, A>>,
}

impl<O: 'static, A: 'static> Router<O, A> {
    /// Creates a router with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a router with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            table: RouteTable::new(config.root_scoped_duplicates),
            config,
            options: TokenizerChain::new(),
            arguments: BindingTable::arguments(),
            not_found: None,
            on_unhandled: None,
            on_done: None,
            on_panic: None,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registers a handler for a route pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPattern`](crate::ConfigError::EmptyPattern)
    /// for a blank pattern, or
    /// [`ConfigError::DuplicatePattern`](crate::ConfigError::DuplicatePattern)
    /// if the normalized pattern is already registered.
    pub fn handle(
        &mut self,
        pattern: &str,
        handler: impl Fn(&mut Context<O, A>) + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        let pattern = Pattern::parse(pattern, self.config.capture_prefix)?;
        self.table.insert(pattern, Box::new(handler))?;
        Ok(self)
    }

    /// Returns a view that registers routes under a shared command phrase.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdln_router::Router;
    ///
    /// let mut router = Router::<(), ()>::new();
    /// let mut remote = router.sub("remote");
    /// remote.handle("add :name :url", |_| {}).unwrap();
    /// remote.sub("branch").handle(":name", |_| {}).unwrap();
    ///
    /// let mut patterns: Vec<_> = router.patterns().map(|p| p.source().to_string()).collect();
    /// patterns.sort();
    /// assert_eq!(patterns, ["remote add :name :url", "remote branch :name"]);
    /// ```
    pub fn sub(&mut self, prefix: &str) -> SubRouter<'_, O, A> {
        SubRouter {
            router: self,
            prefix: prefix.trim().to_string(),
        }
    }

    /// Adds the default tokenizer stage for `table`.
    ///
    /// A wildcard table gets a wildcard stage, any other table a record
    /// stage. Stages run in the order they were added.
    pub fn options(&mut self, table: BindingTable<O>) -> &mut Self {
        self.options.push(tokenizer_for(table, self.config.flag_prefix));
        self
    }

    /// Adds a custom tokenizer stage.
    pub fn tokenizer(&mut self, stage: impl Tokenizer<O> + Send + Sync + 'static) -> &mut Self {
        self.options.push(Box::new(stage));
        self
    }

    /// Sets the table captures are bound through.
    pub fn arguments(&mut self, table: BindingTable<A>) -> &mut Self {
        self.arguments = table;
        self
    }

    /// Runs when no route matches. The completion signal is raised first.
    pub fn not_found(&mut self, hook: impl Fn(&mut Context<O, A>) + Send + Sync + 'static) -> &mut Self {
        self.not_found = Some(Box::new(hook));
        self
    }

    /// Runs instead of routing whenever unrecognized flags are present.
    pub fn on_unhandled(
        &mut self,
        hook: impl Fn(&mut Context<O, A>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_unhandled = Some(Box::new(hook));
        self
    }

    /// Runs after a matched handler returns.
    pub fn on_done(&mut self, hook: impl Fn(&mut Context<O, A>) + Send + Sync + 'static) -> &mut Self {
        self.on_done = Some(Box::new(hook));
        self
    }

    /// Intercepts a panic raised by a handler or hook.
    ///
    /// Without this hook the panic propagates to the caller of
    /// [`parse`](Self::parse).
    pub fn on_panic(
        &mut self,
        hook: impl Fn(&mut Context<O, A>, Box<dyn Any + Send>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_panic = Some(Box::new(hook));
        self
    }

    /// Iterates over every registered pattern.
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.table.iter().map(Route::pattern)
    }

    /// Parses `args` starting from the given option and argument values.
    ///
    /// Use this instead of [`parse`](Self::parse) to supply defaults that
    /// flags and captures may overwrite.
    pub fn parse_with<I, S>(&self, args: I, options: O, arguments: A) -> Context<O, A>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut ctx = Context::new(options, arguments);

        let Tokenized {
            positional,
            unhandled,
            errors,
        } = if self.options.is_empty() {
            RecordTokenizer::<O>::with_prefix(BindingTable::new(), self.config.flag_prefix)
                .tokenize(raw.clone(), ctx.options_mut())
        } else {
            self.options.tokenize(raw.clone(), ctx.options_mut())
        };
        for error in errors {
            ctx.push_error(error);
        }
        ctx.set_tokens(raw, positional);
        ctx.set_unhandled(unhandled);

        if !ctx.unhandled().is_empty() {
            if self.config.fail_on_unhandled {
                let flags = ctx.unhandled().keys().cloned().collect();
                ctx.push_error(DispatchError::UnhandledFlags(flags));
            }
            if let Some(hook) = &self.on_unhandled {
                debug!(flags = ?ctx.unhandled().keys().collect::<Vec<_>>(), "Unhandled flags, skipping routing");
                ctx.complete();
                self.guarded(&mut ctx, |ctx| hook(ctx));
                return ctx;
            }
            if self.config.fail_on_unhandled {
                ctx.complete();
                return ctx;
            }
        }

        self.route(&mut ctx);
        ctx
    }

    fn route(&self, ctx: &mut Context<O, A>) {
        let positional = ctx.positional().to_vec();
        let Some((root, rest)) = positional.split_first() else {
            debug!("No positional tokens");
            self.no_route(ctx);
            return;
        };

        let candidates = self.table.candidates(root);
        if candidates.is_empty() {
            debug!(root = %root, "No route registered for root word");
            self.no_route(ctx);
            return;
        }

        let patterns: Vec<&Pattern> = candidates.iter().map(Route::pattern).collect();
        let outcomes = match_all(&patterns, rest, self.config.match_timeout());

        match arbitrate(outcomes) {
            Arbitration::NoMatch => {
                debug!(root = %root, tokens = ?rest, "No candidate accepted");
                self.no_route(ctx);
            }
            Arbitration::Conflict(indices) => {
                let patterns: Vec<String> = indices
                    .iter()
                    .map(|&i| candidates[i].pattern().source().to_string())
                    .collect();
                warn!(root = %root, patterns = ?patterns, "Ambiguous command");
                ctx.push_error(DispatchError::Conflict {
                    root: root.clone(),
                    patterns,
                });
                ctx.complete();
            }
            Arbitration::Winner { index, captures } => {
                let route = &candidates[index];
                debug!(root = %root, pattern = %route.pattern(), "Route selected");
                self.bind_captures(ctx, captures);
                ctx.complete();
                self.guarded(ctx, |ctx| {
                    (route.handler())(ctx);
                    if let Some(done) = &self.on_done {
                        done(ctx);
                    }
                });
            }
        }
    }

    fn bind_captures(&self, ctx: &mut Context<O, A>, captures: Vec<Capture>) {
        for Capture { name, value } in captures {
            if self
                .arguments
                .assign_wildcard(ctx.arguments_mut(), &name, &value)
            {
                continue;
            }
            match self.arguments.get(&name) {
                Some(binding) => {
                    if let Err(source) = binding.apply(ctx.arguments_mut(), &value, None) {
                        debug!(capture = %name, error = %source, "Capture value rejected");
                        ctx.push_error(BindError::new(name, source));
                    }
                }
                None => debug!(capture = %name, "Capture has no argument binding"),
            }
        }
    }

    fn no_route(&self, ctx: &mut Context<O, A>) {
        ctx.complete();
        if let Some(hook) = &self.not_found {
            self.guarded(ctx, |ctx| hook(ctx));
        }
    }

    fn guarded(&self, ctx: &mut Context<O, A>, run: impl FnOnce(&mut Context<O, A>)) {
        let Some(hook) = &self.on_panic else {
            run(ctx);
            return;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run(&mut *ctx))) {
            warn!("Handler panicked");
            hook(ctx, payload);
        }
    }
}

impl<O: Default + 'static, A: Default + 'static> Router<O, A> {
    /// Parses `args` into fresh default option and argument values.
    pub fn parse<I, S>(&self, args: I) -> Context<O, A>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_with(args, O::default(), A::default())
    }
}

impl<O: 'static, A: 'static> Default for Router<O, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration view that prefixes every pattern with a command phrase.
pub struct SubRouter<'r, O, A> {
    router: &'r mut Router<O, A>,
    prefix: String,
}

impl<O: 'static, A: 'static> SubRouter<'_, O, A> {
    /// The phrase prepended to every pattern.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers `"{prefix} {pattern}"` on the parent router.
    ///
    /// # Errors
    ///
    /// Same as [`Router::handle`].
    pub fn handle(
        &mut self,
        pattern: &str,
        handler: impl Fn(&mut Context<O, A>) + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        let full = format!("{} {}", self.prefix, pattern);
        self.router.handle(&full, handler)?;
        Ok(self)
    }

    /// Nests a further prefix below this one.
    pub fn sub(&mut self, prefix: &str) -> SubRouter<'_, O, A> {
        SubRouter {
            router: &mut *self.router,
            prefix: format!("{} {}", self.prefix, prefix.trim()),
        }
    }
}
