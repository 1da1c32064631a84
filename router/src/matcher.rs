//! Concurrent matching of positional tokens against candidate routes.
//!
//! Every candidate runs as its own task inside a [`rayon::scope`] and owns a
//! private channel. The dispatcher broadcasts each token to every channel in
//! order, then drops the senders to close the streams. A candidate decides
//! from the tokens it has seen so far, so it can reject early but can only
//! accept once its stream is closed.
//!
//! Each task carries a deadline. It checks the deadline before every receive
//! and uses it as the receive bound, so a candidate that has not decided by
//! then gives up on its own with [`Rejection::TimedOut`]. The scope join is
//! therefore bounded by the deadline as well.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use tracing::{debug, warn};

use crate::pattern::{Pattern, Segment};

/// A captured positional token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    pub value: String,
}

/// Why a candidate did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A token arrived after the pattern was fully consumed.
    ExtraTokens { position: usize },
    /// A literal segment did not equal the token at its position.
    LiteralMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    /// The stream closed before the pattern was fully consumed.
    MissingTokens { consumed: usize, expected: usize },
    /// The candidate reached its deadline without deciding.
    TimedOut,
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Vec<Capture>),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Verdict for the candidate at `index` in the slice given to [`match_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub index: usize,
    pub verdict: Verdict,
}

/// Result of arbitrating all outcomes for one root word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration {
    /// No candidate accepted.
    NoMatch,
    /// Exactly one candidate accepted.
    Winner { index: usize, captures: Vec<Capture> },
    /// Several candidates accepted; their indices in ascending order.
    Conflict(Vec<usize>),
}

/// Position and captures of one candidate while tokens are arriving.
#[derive(Debug)]
pub struct PendingMatch<'p> {
    pattern: &'p Pattern,
    position: usize,
    captures: Vec<Capture>,
}

impl<'p> PendingMatch<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            position: 0,
            captures: Vec::new(),
        }
    }

    /// Advances over one token.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] as soon as the token rules the pattern out.
    pub fn feed(&mut self, token: String) -> Result<(), Rejection> {
        let position = self.position;
        match self.pattern.segments().get(position) {
            None => return Err(Rejection::ExtraTokens { position }),
            Some(Segment::Literal(expected)) if *expected != token => {
                return Err(Rejection::LiteralMismatch {
                    position,
                    expected: expected.clone(),
                    found: token,
                });
            }
            Some(Segment::Literal(_)) => {}
            Some(Segment::Capture(name)) => self.captures.push(Capture {
                name: name.clone(),
                value: token,
            }),
        }
        self.position += 1;
        Ok(())
    }

    /// Decides once the stream has closed.
    pub fn finish(self) -> Verdict {
        if self.position == self.pattern.len() {
            Verdict::Accepted(self.captures)
        } else {
            Verdict::Rejected(Rejection::MissingTokens {
                consumed: self.position,
                expected: self.pattern.len(),
            })
        }
    }
}

/// Runs one matcher per pattern over the same token sequence.
///
/// Outcomes come back sorted by candidate index, one per pattern.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cmdln_router::{match_all, Pattern, Verdict};
///
/// let deploy = Pattern::parse("deploy :env", ':').unwrap();
/// let now = Pattern::parse("deploy :env now", ':').unwrap();
/// let tokens = vec!["staging".to_string()];
///
/// let outcomes = match_all(&[&deploy, &now], &tokens, Duration::from_secs(1));
/// assert!(outcomes[0].verdict.is_accepted());
/// assert!(matches!(outcomes[1].verdict, Verdict::Rejected(_)));
/// ```
pub fn match_all(patterns: &[&Pattern], tokens: &[String], timeout: Duration) -> Vec<Outcome> {
    let deadline = Instant::now() + timeout;
    let (result_tx, result_rx) = unbounded();

    rayon::scope(|scope| {
        let mut feeds = Vec::with_capacity(patterns.len());
        for (index, &pattern) in patterns.iter().enumerate() {
            let (feed_tx, feed_rx) = unbounded::<String>();
            feeds.push(feed_tx);
            let result_tx = result_tx.clone();
            scope.spawn(move |_| {
                let verdict = run_candidate(pattern, &feed_rx, deadline);
                debug!(pattern = %pattern, verdict = ?verdict, "Candidate finished");
                // The receiver outlives the scope.
                let _ = result_tx.send(Outcome { index, verdict });
            });
        }

        for token in tokens {
            // A candidate that already rejected has dropped its receiver.
            feeds.retain(|feed| feed.send(token.clone()).is_ok());
        }
        drop(feeds);
    });
    drop(result_tx);

    let mut outcomes: Vec<Outcome> = result_rx.try_iter().collect();
    outcomes.sort_by_key(|o| o.index);
    outcomes
}

/// Reduces candidate outcomes to a single decision.
///
/// The winner is never chosen by order: two or more acceptances are always
/// a conflict.
pub fn arbitrate(outcomes: Vec<Outcome>) -> Arbitration {
    let mut accepted: Vec<(usize, Vec<Capture>)> = outcomes
        .into_iter()
        .filter_map(|o| match o.verdict {
            Verdict::Accepted(captures) => Some((o.index, captures)),
            Verdict::Rejected(_) => None,
        })
        .collect();

    match accepted.len() {
        0 => Arbitration::NoMatch,
        1 => {
            let (index, captures) = accepted.remove(0);
            Arbitration::Winner { index, captures }
        }
        _ => Arbitration::Conflict(accepted.into_iter().map(|(i, _)| i).collect()),
    }
}

fn run_candidate(pattern: &Pattern, feed: &Receiver<String>, deadline: Instant) -> Verdict {
    let mut state = PendingMatch::new(pattern);
    loop {
        if Instant::now() >= deadline {
            warn!(pattern = %pattern, "Candidate timed out");
            return Verdict::Rejected(Rejection::TimedOut);
        }
        match feed.recv_deadline(deadline) {
            Ok(token) => {
                if let Err(rejection) = state.feed(token) {
                    return Verdict::Rejected(rejection);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return state.finish(),
            Err(RecvTimeoutError::Timeout) => {
                warn!(pattern = %pattern, "Candidate timed out");
                return Verdict::Rejected(Rejection::TimedOut);
            }
        }
    }
}
