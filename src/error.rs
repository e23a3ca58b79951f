use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
    #[error("invalid scene configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;
