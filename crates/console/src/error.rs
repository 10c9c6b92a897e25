use crewboard_client::api::ApiError;
use crewboard_core::allocation::FieldErrors;
use crewboard_core::error::CoreError;

/// Console-level error type.
///
/// Wraps [`CoreError`] and [`ApiError`] and adds local storage, configuration
/// and form validation failures. None of these are fatal: every panel turns
/// them into an empty state, a toast, or inline field errors.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// A domain-level error from `crewboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The allocation or team form has invalid fields.
    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    /// Reading or writing the local preferences file failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A stored or received value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Bad configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No allocation editor is open.
    #[error("No allocation is being edited")]
    NoSelection,
}

/// Convenience type alias for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    /// Text shown to the user in a toast.
    ///
    /// Backend rejections and validation messages are shown as-is; transport
    /// and internal failures are logged and replaced with a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Core(core) => match core {
                CoreError::NotFound { entity, id } => format!("{entity} {id} no longer exists"),
                CoreError::Validation(msg) => msg.clone(),
            },
            ConsoleError::Api(api) => match api {
                ApiError::Rejected(msg) => msg.clone(),
                ApiError::Status { status, body } => {
                    tracing::error!(status, body = %body, "Backend returned an error status");
                    if *status == 401 || *status == 403 {
                        "Your session does not allow this action".to_string()
                    } else {
                        "The server could not complete the request".to_string()
                    }
                }
                ApiError::Request(err) => {
                    tracing::error!(error = %err, "Backend request failed");
                    "Could not reach the server, please retry".to_string()
                }
            },
            ConsoleError::Invalid(_) => "Please correct the highlighted fields".to_string(),
            ConsoleError::NoSelection => "Select a slot on the board first".to_string(),
            ConsoleError::Storage(err) => {
                tracing::error!(error = %err, "Preferences storage error");
                "Your preferences could not be saved".to_string()
            }
            ConsoleError::Serde(err) => {
                tracing::error!(error = %err, "Serialization error");
                "Something went wrong, please try again".to_string()
            }
            ConsoleError::Config(msg) => msg.clone(),
        }
    }
}
