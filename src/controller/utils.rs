use failure::{Error as FailureError, Fail};
use futures::{Future, Stream};
use hyper;
use hyper::Body;
use serde::de::DeserializeOwned;
use serde_json;

use errors::Error;

/// Collects the whole body into a string
pub fn read_body(body: Body) -> Box<Future<Item = String, Error = hyper::Error>> {
    Box::new(body.concat2().map(|chunk| String::from_utf8_lossy(&chunk).into_owned()))
}

/// Reads the body and deserializes it from JSON. Anything unreadable is `Error::Parse`.
pub fn parse_body<T>(body: Body) -> Box<Future<Item = T, Error = FailureError>>
where
    T: DeserializeOwned + 'static,
{
    Box::new(
        read_body(body)
            .map_err(|e| FailureError::from(Error::Parse.context(format!("Failed to read request body: {}", e))))
            .and_then(|body| {
                serde_json::from_str::<T>(&body)
                    .map_err(|e| FailureError::from(Error::Parse.context(format!("Request body is not valid JSON: {}", e))))
            }),
    )
}
