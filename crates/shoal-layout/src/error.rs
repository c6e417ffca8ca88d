pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] shoal_core::Error),

    #[error(transparent)]
    Solver(#[from] narwhal::Error),

    #[error("Invalid layout setting `{key}`: {message}")]
    InvalidSettings { key: String, message: String },
}
