use failure::Error as FailureError;
use futures::future::Future;
use hyper::header::{ContentLength, ContentType};
use hyper::server::Response;
use hyper::StatusCode;

pub type ControllerFuture = Box<Future<Item = Reply, Error = FailureError>>;

/// Serialized JSON body with the status it is sent with
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    pub fn ok(body: String) -> Self {
        Self::new(StatusCode::Ok, body)
    }

    pub fn into_response(self) -> Response {
        Response::new()
            .with_status(self.status)
            .with_header(ContentType::json())
            .with_header(ContentLength(self.body.len() as u64))
            .with_body(self.body)
    }
}
