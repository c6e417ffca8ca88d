pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Config syntax error: {message}")]
    ConfigSyntax { message: String },

    #[error("Collection `{id}` is already registered")]
    DuplicateCollection { id: String },
}
