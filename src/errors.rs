use failure::Error as FailureError;
use hyper::StatusCode;
use serde_json;
use validator::ValidationErrors;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error: {}", _0)]
    Validate(ValidationErrors),
    #[fail(display = "Malformed input: {}", _0)]
    MalformedInput(String),
    #[fail(display = "Payment gateway refused the request: {}", _0)]
    PaymentGateway(String),
    #[fail(display = "Durable store is unavailable")]
    StoreUnavailable,
}

impl Error {
    /// Converts `Error` to HTTP Status Code
    pub fn code(&self) -> StatusCode {
        match *self {
            Error::NotFound => StatusCode::NotFound,
            Error::Parse => StatusCode::UnprocessableEntity,
            Error::Validate(_) | Error::MalformedInput(_) | Error::PaymentGateway(_) => StatusCode::BadRequest,
            Error::StoreUnavailable => StatusCode::InternalServerError,
        }
    }

    /// Message shown to the client
    pub fn message(&self) -> String {
        match *self {
            Error::Validate(ref errors) => serde_json::to_string(errors).unwrap_or_else(|_| "Validation error".to_string()),
            Error::StoreUnavailable => "Internal server error".to_string(),
            ref other => other.to_string(),
        }
    }
}

/// Finds the first typed `Error` in the cause chain of a failure.
pub fn find_error(err: &FailureError) -> Option<&Error> {
    err.iter_chain().filter_map(|cause| cause.downcast_ref::<Error>()).next()
}

/// Renders the whole context chain, outermost first.
pub fn error_chain(err: &FailureError) -> String {
    err.iter_chain().map(|cause| cause.to_string()).collect::<Vec<_>>().join(": ")
}
