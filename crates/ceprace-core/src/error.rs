use thiserror::Error;

/// Validation and configuration errors exposed by `ceprace-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cep is invalid")]
    EmptyCep,

    #[error("invalid provider '{value}', expected one of viacep, apicep")]
    InvalidProvider { value: String },

    #[error("race deadline must be greater than zero")]
    ZeroDeadline,
    #[error("invalid deadline '{value}', expected a whole number of milliseconds")]
    InvalidDeadline { value: String },

    #[error("url template must contain a {{cep}} placeholder: '{template}'")]
    MissingCepPlaceholder { template: String },
}
