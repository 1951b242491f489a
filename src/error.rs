pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database request failed: {0}")]
    TokioRusqliteFailed(tokio_rusqlite::Error),
    #[error("database request failed: {0}")]
    RusqliteFailed(rusqlite::Error),
    #[error("error reading file: {0}")]
    IOFailed(std::io::Error),
    #[error("error encoding payload: {0}")]
    SerdeFailed(serde_json::Error),
    #[error("malformed reading annotation: {0}")]
    MalformedAnnotation(String),
    #[error("{readings} readings cannot be aligned with {units} display units")]
    ReadingCountMismatch { readings: usize, units: usize },
    #[error("gloss references nonexistent word {0}")]
    ForeignKeyViolation(i64),
    #[error("error rewriting wrapper markup: {0}")]
    RewriteFailed(lol_html::errors::RewritingError),
    #[error("error building qr code: {0}")]
    QrFailed(qrcode::types::QrError),
    #[error("error pushing to display api: {0}")]
    HttpFailed(reqwest::Error),
    #[error("display api rejected payload with status {0}: {1}")]
    PushRejected(u16, String),
}

impl From<tokio_rusqlite::Error> for Error {
    fn from(error: tokio_rusqlite::Error) -> Self {
        match error {
            tokio_rusqlite::Error::Other(error) => {
                if error.downcast_ref::<Self>().is_some() {
                    *error.downcast().unwrap()
                } else {
                    Self::TokioRusqliteFailed(tokio_rusqlite::Error::Other(error))
                }
            }
            _ => Self::TokioRusqliteFailed(error),
        }
    }
}

impl From<Error> for tokio_rusqlite::Error {
    fn from(error: Error) -> Self {
        Self::Other(Box::new(error))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Self::RusqliteFailed(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::IOFailed(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::SerdeFailed(error)
    }
}

impl From<lol_html::errors::RewritingError> for Error {
    fn from(error: lol_html::errors::RewritingError) -> Self {
        Self::RewriteFailed(error)
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(error: qrcode::types::QrError) -> Self {
        Self::QrFailed(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::HttpFailed(error)
    }
}
