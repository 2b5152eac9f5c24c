use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const INVALID_TRACE: i32 = 3;
    pub const DATABASE_ERROR: i32 = 4;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Database(_) => exit_code::DATABASE_ERROR,
            Error::InvalidTrace(_) => exit_code::INVALID_TRACE,
            Error::InvalidArgument(_) => exit_code::INVALID_ARGUMENTS,
            Error::Io(_) => exit_code::GENERAL_ERROR,
        }
    }
}
