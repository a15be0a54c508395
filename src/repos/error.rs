use reqwest::Error as HttpError;

/// Repos layer Error
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Constraint violation: {}", _0)]
    ConstraintViolation(String),
    #[fail(display = "Mismatched type: {}", _0)]
    MismatchedType(String),
    #[fail(display = "Durable store connection error: {}", _0)]
    Connection(String),
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        if err.is_serialization() {
            Error::MismatchedType(format!("{}", err))
        } else {
            Error::Connection(format!("{}", err))
        }
    }
}
