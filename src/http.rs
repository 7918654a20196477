#[cfg(test)]
pub(crate) mod test_server;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum FetchError {
    #[error("HTTP status {status}{}", preview_suffix(.body))]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid JSON response: {0}")]
    Decode(String),
}

fn preview_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({body})")
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeouts {
    pub(crate) connect: Duration,
    pub(crate) read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(20),
        }
    }
}

/// Single GET returning the parsed JSON body. Any status outside 2xx is a
/// failure regardless of body content; nothing is retried here.
pub(crate) fn get_json(
    url: &str,
    query: &[(&str, &str)],
    timeouts: Timeouts,
) -> Result<Value, FetchError> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeouts.connect)
        .timeout_read(timeouts.read)
        .timeout_write(timeouts.read)
        .build();

    let mut request = agent.get(url).set("Accept", "application/json");
    for (key, value) in query {
        request = request.query(key, value);
    }

    debug!(url, ?query, "sending request");
    match request.call() {
        Ok(response) => {
            let status = response.status();
            let body = response
                .into_string()
                .map_err(|err| FetchError::Transport(format!("response read failed: {err}")))?;
            if !(200..=299).contains(&status) {
                warn!(url, status, "unexpected non-success status");
                return Err(FetchError::Status {
                    status,
                    body: body_preview(&body),
                });
            }
            serde_json::from_str(&body).map_err(|err| {
                warn!(url, error = %err, "response body is not valid JSON");
                FetchError::Decode(err.to_string())
            })
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().ok().unwrap_or_default();
            warn!(url, status, "request rejected");
            Err(FetchError::Status {
                status,
                body: body_preview(&body),
            })
        }
        Err(ureq::Error::Transport(err)) => {
            warn!(url, error = %err, "transport failure");
            Err(FetchError::Transport(err.to_string()))
        }
    }
}

fn body_preview(body: &str) -> String {
    body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::test_server::{Behavior, TestServer};
    use super::*;

    fn short_timeouts() -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(200),
            read: Duration::from_millis(200),
        }
    }

    #[test]
    fn parses_json_body_on_success() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            r#"{"data":[{"bookId":"1"}]}"#.to_string(),
        )]);

        let value = get_json(&server.base_url, &[], short_timeouts()).expect("should succeed");
        assert_eq!(value["data"][0]["bookId"], "1");
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn non_success_status_fails_without_retry() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, r#"{"data":[]}"#.to_string()),
            Behavior::Respond(200, r#"{"data":[]}"#.to_string()),
        ]);

        let err = get_json(&server.base_url, &[], short_timeouts()).expect_err("503 must fail");
        match &err {
            FetchError::Status { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, r#"{"data":[]}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("HTTP status 503"));
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn client_error_status_is_reported() {
        let server = TestServer::spawn(vec![Behavior::Respond(404, String::new())]);

        let err = get_json(&server.base_url, &[], short_timeouts()).expect_err("404 must fail");
        assert_eq!(
            err,
            FetchError::Status {
                status: 404,
                body: String::new()
            }
        );
        assert_eq!(err.to_string(), "HTTP status 404");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "<html>".to_string())]);

        let err = get_json(&server.base_url, &[], short_timeouts()).expect_err("html is not json");
        assert!(matches!(err, FetchError::Decode(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn slow_response_is_a_transport_error() {
        let server = TestServer::spawn(vec![Behavior::DelayRespond(
            Duration::from_millis(150),
            200,
            "{}".to_string(),
        )]);
        let timeouts = Timeouts {
            connect: Duration::from_millis(200),
            read: Duration::from_millis(20),
        };

        let err = get_json(&server.base_url, &[], timeouts).expect_err("read should time out");
        assert!(matches!(err, FetchError::Transport(_)), "unexpected error: {err:?}");
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn query_parameters_are_url_encoded() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "[]".to_string())]);

        get_json(
            &server.base_url,
            &[("query", "love & revenge/2")],
            short_timeouts(),
        )
        .expect("should succeed");

        let path = server.last_request_path().expect("request should be recorded");
        assert_eq!(path, "/?query=love+%26+revenge%2F2");
    }
}
