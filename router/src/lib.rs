//! Routing of command-line arguments to registered handlers.
//!
//! A [`Router`] holds route patterns such as `"deploy :env"` grouped by
//! their root word. Parsing an argument list:
//!
//! 1. runs the option tokenizer chain from [`cmdln_core`], binding flags into
//!    the option value and leaving the positional residual;
//! 2. looks up every route under the residual's first word;
//! 3. matches the remaining tokens against all of them concurrently
//!    ([`match_all`]) and requires exactly one to accept ([`arbitrate`]);
//! 4. binds the winner's captures into the argument value and runs its
//!    handler with the [`Context`].
//!
//! Registration errors are returned as [`ConfigError`]. Everything that goes
//! wrong during a parse is collected on the context as [`DispatchError`]s.
//!
//! # Example
//!
//! ```
//! use cmdln_router::{DispatchError, Router};
//!
//! let mut router = Router::<(), ()>::new();
//! router.handle("task run", |_| {}).unwrap();
//! router.handle("task :name", |_| {}).unwrap();
//!
//! let ctx = router.parse(["task", "run"]);
//! let errors = ctx.error().unwrap();
//! assert!(matches!(
//!     errors.iter().next(),
//!     Some(DispatchError::Conflict { .. })
//! ));
//! assert!(ctx.is_done());
//! ```

mod config;
mod context;
mod error;
mod matcher;
mod pattern;
mod router;
mod table;

pub use config::RouterConfig;
pub use context::Context;
pub use error::{ConfigError, DispatchError, ErrorStack, PromptError, Result};
pub use matcher::{
    Arbitration, Capture, Outcome, PendingMatch, Rejection, Verdict, arbitrate, match_all,
};
pub use pattern::{CAPTURE_PLACEHOLDER, Pattern, Segment};
pub use router::{Router, SubRouter};
pub use table::{Route, RouteTable};
