//! Per-invocation state machine.
//!
//! ```text
//! Pending → Validating → Authenticating → Sending ⇄ Retrying
//!                              ↑              │
//!                              └── 401 once ──┤
//!                                             ↓
//!                                  Succeeded | Failed
//! ```
//!
//! Retry decisions live in `InvocationState::classify`: one attempt counter
//! bounded by the retry policy plus one forced-refresh flag.

use std::time::Duration;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Validating,
    Authenticating,
    Sending,
    Retrying,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }

    pub fn can_transition_to(self, to: Phase) -> bool {
        match (self, to) {
            (Phase::Pending, Phase::Validating) => true,
            (Phase::Validating, Phase::Authenticating) => true,
            // Token acquisition, first send, or replay after a forced refresh
            (Phase::Authenticating, Phase::Sending) => true,
            (Phase::Sending, Phase::Retrying) => true,
            (Phase::Sending, Phase::Authenticating) => true,
            (Phase::Sending, Phase::Succeeded) => true,
            (Phase::Retrying, Phase::Sending) => true,
            // Any live phase may fail
            (from, Phase::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// What one outbound attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Response received.
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// Connection failure, timeout, or body read failure.
    Transport,
}

impl AttemptOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            AttemptOutcome::Status { status, .. } => Some(*status),
            AttemptOutcome::Transport => None,
        }
    }
}

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Done,
    /// Discard the token, get a new one, resend. Does not consume an attempt.
    RefreshAndResend,
    RetryAfter(Duration),
    Fail { retryable: bool },
}

#[derive(Debug, Clone)]
pub struct InvocationState {
    phase: Phase,
    policy: RetryPolicy,
    /// Attempts counted against the cap.
    attempts: u32,
    /// Every outbound resource call, the 401 replay included.
    sends: u32,
    forced_refresh: bool,
    last_status: Option<u16>,
}

impl InvocationState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            phase: Phase::Pending,
            policy,
            attempts: 0,
            sends: 0,
            forced_refresh: false,
            last_status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn sends(&self) -> u32 {
        self.sends
    }

    pub fn forced_refresh(&self) -> bool {
        self.forced_refresh
    }

    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    pub fn advance(&mut self, to: Phase) {
        if !self.phase.can_transition_to(to) {
            tracing::warn!(from = ?self.phase, to = ?to, "unexpected invocation phase transition");
        }
        self.phase = to;
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Failed;
        }
    }

    /// Record that a request is about to go out.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
        self.sends += 1;
    }

    pub fn classify(&mut self, outcome: AttemptOutcome) -> Verdict {
        if let Some(status) = outcome.status() {
            self.last_status = Some(status);
        }

        match outcome {
            AttemptOutcome::Status { status, .. } if (200..300).contains(&status) => Verdict::Done,
            AttemptOutcome::Status { status: 401, .. } => {
                if self.forced_refresh {
                    Verdict::Fail { retryable: false }
                } else {
                    self.forced_refresh = true;
                    // The rejected attempt is replayed, not retried.
                    self.attempts -= 1;
                    Verdict::RefreshAndResend
                }
            }
            AttemptOutcome::Status {
                status,
                retry_after,
            } if status == 429 || (500..600).contains(&status) => {
                self.retry_or_fail(retry_after)
            }
            AttemptOutcome::Status { .. } => Verdict::Fail { retryable: false },
            AttemptOutcome::Transport => self.retry_or_fail(None),
        }
    }

    fn retry_or_fail(&self, retry_after: Option<Duration>) -> Verdict {
        if !self.policy.has_attempts_left(self.attempts) {
            return Verdict::Fail { retryable: true };
        }
        let delay = match retry_after {
            Some(hint) => hint.min(self.policy.max_delay),
            None => self.policy.backoff(self.attempts),
        };
        Verdict::RetryAfter(delay)
    }
}
