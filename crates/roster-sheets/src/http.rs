//! Shared HTTP response helpers for the Google backend.
//!
//! Maps the Sheets API failure shapes onto [`SheetsError`] so the request
//! code only deals with the happy path.

use serde::Deserialize;

use crate::error::SheetsError;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Check an HTTP response for error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **404**, and **400** "Unable to parse range" (how the API reports a
///   missing sheet title) → [`SheetsError::NotFound`]
/// - **400** "already exists" → [`SheetsError::AlreadyExists`]
/// - **401** → [`SheetsError::Auth`]
/// - any other non-success status → [`SheetsError::Api`]
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify(status.as_u16(), &body))
}

fn classify(status: u16, body: &str) -> SheetsError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        404 => SheetsError::NotFound(message),
        400 if message.contains("Unable to parse range") => SheetsError::NotFound(message),
        400 if message.contains("already exists") => SheetsError::AlreadyExists(message),
        401 => SheetsError::Auth(message),
        _ => SheetsError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn check_response_success() {
        let resp = mock_response(200, "{}");
        assert!(check_response(resp).await.is_ok());
    }

    #[tokio::test]
    async fn unparseable_range_is_not_found() {
        let resp = mock_response(
            400,
            r#"{"error":{"code":400,"message":"Unable to parse range: 'Nope'!1:1","status":"INVALID_ARGUMENT"}}"#,
        );
        let err = check_response(resp).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn duplicate_sheet_is_already_exists() {
        let resp = mock_response(
            400,
            r#"{"error":{"code":400,"message":"Invalid requests[0].addSheet: A sheet with the name \"Students\" already exists. Please enter another name."}}"#,
        );
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, SheetsError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn other_failures_keep_status_and_message() {
        let resp = mock_response(500, r#"{"error":{"message":"backend exploded"}}"#);
        let err = check_response(resp).await.unwrap_err();
        match err {
            SheetsError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_kept_verbatim() {
        let resp = mock_response(502, "Bad Gateway");
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, SheetsError::Api { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn unauthorized_is_auth() {
        assert!(matches!(classify(401, ""), SheetsError::Auth(_)));
    }
}
