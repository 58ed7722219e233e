use axum::body::{self, Body};
use axum::response::{ErrorResponse, IntoResponse, Response};
use serde::de::DeserializeOwned;

/// Used in tests to both extract the raw bytes from the HTTP response body and then
/// deserialize them into the requested type. Will panic and fail the test if either
/// step fails somehow.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse body content into data structure! Error: {}, Received body: {:?}",
            err, bytes
        )
    })
}

/// Turns an [ErrorResponse] from a handler's error path into a concrete [Response]
/// whose status and body can be asserted on.
pub fn response_from_error(err: ErrorResponse) -> Response {
    Err::<(), ErrorResponse>(err).into_response()
}
