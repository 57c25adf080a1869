use crate::controller::HttpMethod;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NestError>;

/// Configuration errors raised while the module graph is built.
///
/// Every variant aborts startup: the graph is static, so a broken graph is a
/// programming error rather than a runtime condition.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("Unknown module: no module is registered under token '{token}'")]
    UnknownModule { token: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("{message}")]
    NoneInjectable { type_name: String, message: String },

    #[error(
        "{type_name} has no module metadata. Declare it with #[module(...)] and at least one of `imports`, `providers` or `controllers`"
    )]
    MissingModuleMetadata { type_name: String },

    #[error(
        "{module} exports {export}, which is neither one of its providers nor exported by one of its imports"
    )]
    InvalidExport { module: String, export: String },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error(
        "{type_name} was already built from its constructor, so a value provider for it can no longer take effect. Import the module providing the value before any module that depends on {type_name}"
    )]
    ValueProviderConflict { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Route {method} {path} is declared twice (second declaration: {endpoint})")]
    DuplicateRoute {
        method: HttpMethod,
        path: String,
        endpoint: String,
    },

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NestError {
    /// Builds the rejection for a type used as a provider or dependency
    /// without carrying the injectable marker.
    pub fn none_injectable(type_name: &str, module: Option<&str>) -> Self {
        let location = match module {
            Some(module) => format!("the providers list of {module}"),
            None => "the providers list of its module".to_string(),
        };
        let message = format!(
            "{type_name} is not injectable.\n\
             To make {type_name} injectable, add #[derive(Injectable)] to its definition\n\
             or remove {type_name} from {location}.\n\
             Please check your code and ensure that the derive is applied to the type."
        );
        NestError::NoneInjectable {
            type_name: type_name.to_string(),
            message,
        }
    }

    pub fn unknown_module(token: impl Into<String>) -> Self {
        NestError::UnknownModule {
            token: token.into(),
        }
    }
}

impl axum::response::IntoResponse for NestError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "request failed on a container error");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            self.to_string(),
        )
            .into_response()
    }
}
