/// Errors raised while configuring or using an MDP
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MdpError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, MdpError>;
