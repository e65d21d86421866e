use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: `{0}`")]
    InvalidInput(String),
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },
    #[error("no data: {0}")]
    NoData(String),
    #[error("plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error(transparent)]
    Http(#[from] ureq::Error),
}

impl Error {
    pub(crate) fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
