//! # Session Driver Contract
//!
//! The shared interface both payment-surface adapters implement. The
//! orchestrator holds one driver per surface and dispatches over this trait;
//! everything surface-specific (event shapes, completion call forms) stays
//! inside the adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cart::{Cart, ShippingMethod};
use crate::error::{CheckoutError, CheckoutResult};

/// Which browser payment surface an adapter drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionApiKind {
    /// Native session API (variant A)
    NativeSession,
    /// W3C request API (variant B)
    PaymentRequest,
}

impl SessionApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionApiKind::NativeSession => "native_session",
            SessionApiKind::PaymentRequest => "payment_request",
        }
    }
}

impl std::fmt::Display for SessionApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of one checkout attempt.
///
/// `Negotiating` and `PaymentAuthorized` are event-driven detours from
/// `Started`; `Completed`, `Aborted` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingCapabilityCheck,
    SessionCreated,
    Started,
    Negotiating,
    PaymentAuthorized,
    Completed,
    Aborted,
    Cancelled,
}

impl SessionPhase {
    /// True once the session can no longer receive events
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Completed | SessionPhase::Aborted | SessionPhase::Cancelled
        )
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingCapabilityCheck => "awaiting_capability_check",
            SessionPhase::SessionCreated => "session_created",
            SessionPhase::Started => "started",
            SessionPhase::Negotiating => "negotiating",
            SessionPhase::PaymentAuthorized => "payment_authorized",
            SessionPhase::Completed => "completed",
            SessionPhase::Aborted => "aborted",
            SessionPhase::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of `create_session`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCreation {
    /// A session occupies the slot and can be started
    Ready,
    /// The device reported no usable card; nothing was created and the
    /// caller may fall back to the other surface
    NoUsableCard,
}

/// Outcome of `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The sheet is up; the session now advances on browser events
    /// (native surface)
    Presented,
    /// The blocking sheet call ran to authorized completion
    /// (request surface)
    Authorized,
    /// No session existed to start; nothing happened
    NotStarted,
}

/// Callback through which an adapter reports fatal in-session errors that
/// occur after `start` has returned
pub type ErrorCallback = Arc<dyn Fn(CheckoutError) + Send + Sync>;

/// One payment-surface adapter: owns at most one live session and mediates
/// every event between the browser and the checkout backend.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Which surface this driver adapts
    fn kind(&self) -> SessionApiKind;

    /// Whether the underlying browser surface exists at all
    fn is_available(&self) -> bool;

    /// Current lifecycle phase
    fn phase(&self) -> SessionPhase;

    /// Create exactly one session from the cart and its shipping methods.
    /// Fails with a session-exists error if the slot is occupied.
    async fn create_session(
        &self,
        cart: &Cart,
        shipping_methods: &[ShippingMethod],
    ) -> CheckoutResult<SessionCreation>;

    /// Start the created session. What starting means differs per surface;
    /// see [`StartOutcome`].
    async fn start(&self) -> CheckoutResult<StartOutcome>;

    /// Tear the session down: rebind handlers to no-ops, abort, release the
    /// slot. Idempotent; safe with no session.
    fn end_session(&self);
}

/// Type alias for a shared driver instance
pub type BoxedSessionDriver = Arc<dyn SessionDriver>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(SessionPhase::Completed.is_terminal());
        assert!(SessionPhase::Aborted.is_terminal());
        assert!(SessionPhase::Cancelled.is_terminal());
        assert!(!SessionPhase::Started.is_terminal());
        assert!(!SessionPhase::Idle.is_terminal());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(SessionApiKind::NativeSession.to_string(), "native_session");
        assert_eq!(SessionApiKind::PaymentRequest.to_string(), "payment_request");
    }
}
