//! Actor Error Types
//!
//! Every error here is fatal to the actor that raises it. The poison pill is
//! not an error: it travels through the ordinary dispatch path.

use thiserror::Error;

/// Main actor substrate error type
#[derive(Error, Debug)]
pub enum ActorError {
    /// A domain hook was invoked without an override
    #[error("Hook '{hook}' is not implemented")]
    NotImplemented { hook: String },

    /// `get` was called on a mailbox with nothing queued
    #[error("Mailbox of '{actor}' is empty")]
    EmptyMailbox { actor: String },

    /// The receiving actor has terminated and dropped its mailbox
    #[error("Mailbox of '{actor}' is closed")]
    MailboxClosed { actor: String },

    /// More envelopes pending than there are senders allowed one message per step
    #[error("Mailbox overflow on '{actor}': {pending} pending envelopes, limit {limit}")]
    MailboxOverflow {
        actor: String,
        pending: usize,
        limit: usize,
    },

    /// A typed handler was resolved for a payload of another type
    #[error("Message type mismatch: expected {expected}, got {actual}")]
    MessageType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Domain logic failed while handling a message
    #[error("Handler error in '{actor}': {message}")]
    Handler {
        actor: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// The actor task panicked or was cancelled
    #[error("Actor '{actor}' panicked: {message}")]
    Panicked { actor: String, message: String },
}

/// Result type alias for actor operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create a not implemented error for a domain hook
    pub fn not_implemented(hook: impl Into<String>) -> Self {
        Self::NotImplemented { hook: hook.into() }
    }

    pub fn empty_mailbox(actor: impl Into<String>) -> Self {
        Self::EmptyMailbox {
            actor: actor.into(),
        }
    }

    pub fn mailbox_closed(actor: impl Into<String>) -> Self {
        Self::MailboxClosed {
            actor: actor.into(),
        }
    }

    pub fn mailbox_overflow(actor: impl Into<String>, pending: usize, limit: usize) -> Self {
        Self::MailboxOverflow {
            actor: actor.into(),
            pending,
            limit,
        }
    }

    pub fn message_type(expected: &'static str, actual: &'static str) -> Self {
        Self::MessageType { expected, actual }
    }

    /// Create a handler error
    pub fn handler(actor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            actor: actor.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a handler error with source
    pub fn handler_with_source(
        actor: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Handler {
            actor: actor.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    pub fn panicked(actor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            actor: actor.into(),
            message: message.into(),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ActorError::NotImplemented { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::NotImplemented { .. } => "not_implemented",
            ActorError::EmptyMailbox { .. } => "empty_mailbox",
            ActorError::MailboxClosed { .. } => "mailbox_closed",
            ActorError::MailboxOverflow { .. } => "mailbox_overflow",
            ActorError::MessageType { .. } => "message_type",
            ActorError::Handler { .. } => "handler",
            ActorError::Configuration { .. } => "configuration",
            ActorError::Panicked { .. } => "panicked",
        }
    }
}
