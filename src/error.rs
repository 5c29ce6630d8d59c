use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preflight check failed: {0}")]
    Preflight(String),

    /// An external command exited non-zero. Carries the exit code so the
    /// process can exit with the same status.
    #[error("Step '{step}' failed with exit code {code}")]
    StepFailed { step: String, code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DevstrapError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DevstrapError::StepFailed { code, .. } => *code,
            DevstrapError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DevstrapError>;
