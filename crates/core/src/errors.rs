use thiserror::Error;

use crate::domain::recommendation::ActionKind;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("unknown service type `{0}`")]
    UnknownServiceType(String),
    #[error("unknown recommendation action `{0}`")]
    UnknownAction(String),
    #[error("action `{action}` is not allowed on a {state} recommendation")]
    InvalidActionTransition { action: ActionKind, state: String },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("recommendation `{0}` not found")]
    RecommendationNotFound(String),
    #[error("persistence failure during {phase}: {message}")]
    Persistence { phase: String, message: String },
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn persistence(phase: impl Into<String>, message: impl ToString) -> Self {
        Self::Persistence { phase: phase.into(), message: message.to_string() }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested recommendation was not found.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::RecommendationNotFound(id) => Self::NotFound {
                message: format!("recommendation `{id}` not found"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence { phase, .. } => Self::ServiceUnavailable {
                message: format!("storage unavailable during {phase}"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Integration(message) => Self::ServiceUnavailable {
                message,
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
