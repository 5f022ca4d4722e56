//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Every variant is a configuration or programming error; nothing here is
/// transient, so none of them is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GymDmcError {
    /// The environment id does not follow `[namespace/]name[-vVERSION]`.
    #[error("Malformed environment ID: {id}. (Currently all IDs must be of the form {grammar}.)")]
    MalformedIdentifier {
        /// The offending id.
        id: String,
        /// The expected grammar.
        grammar: &'static str,
    },

    /// No spec is registered under the id.
    #[error("No registered env with id: {0}")]
    UnknownEnvironment(String),

    /// The entry point of a spec could not be resolved.
    #[error("Could not resolve entry point: {0}")]
    ConstructorNotFound(String),

    /// The render mode is not implemented.
    #[error("`{0}` mode is not implemented")]
    UnsupportedRenderMode(String),

    /// The key is absent from the observation space.
    #[error("Observation key `{key}` is not in the observation space (available: {available:?})")]
    MissingObservationKey {
        /// Requested key.
        key: String,
        /// Keys of the wrapped space.
        available: Vec<String>,
    },

    /// `step` or `render` was called before `reset`, or after the episode ended.
    #[error("Cannot call env.{0}() before calling env.reset()")]
    ResetNeeded(&'static str),

    /// Invalid value in an environment configuration or kwargs.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The action does not fit the action space.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// The environment was already closed.
    #[error("Environment is closed")]
    Closed,

    /// The control suite has no such domain or task.
    #[error("Unknown task: {domain}/{task}")]
    UnknownTask {
        /// Domain name.
        domain: String,
        /// Task name.
        task: String,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The constructed environment does not carry its spec.
    #[error("expected spec to be set to the unwrapped env")]
    SpecNotSet,
}
