use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the blackboard protocol.
///
/// Nothing in the protocol retries. Every variant surfaces to the caller,
/// which is expected to be an outer loop able to restart the whole session
/// lifecycle with a fresh hydrate.
#[derive(Debug, Error)]
pub enum BoardError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Store transport ─────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Payload encoding ────────────────────────────────────────────────
    #[error("serialization: {0}")]
    Serialization(#[from] SerializationError),

    // ── Lifecycle ───────────────────────────────────────────────────────
    #[error("state: {0}")]
    State(#[from] StateError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVariable(String),

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("store {store} request failed: {message}")]
    Request { store: String, message: String },

    #[error("store {store} returned HTTP {status}: {body}")]
    Http {
        store: String,
        status: u16,
        body: String,
    },

    #[error("store {store} rejected command: {message}")]
    Command { store: String, message: String },

    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },
}

// ─── Serialization errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("payload at {key} is not valid: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("value at {key} is not a number: {value}")]
    InvalidNumber { key: String, value: String },
}

// ─── Lifecycle errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no state to persist; hydrate must run first")]
    NotHydrated,

    #[error("session {session_id} is already hydrated")]
    AlreadyHydrated { session_id: String },

    #[error("state belongs to session {actual}, expected {expected}")]
    SessionMismatch { expected: String, actual: String },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTaskTransition {
        task_id: String,
        from: String,
        to: String,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, BoardError>;
