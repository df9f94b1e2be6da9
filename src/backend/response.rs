use super::AnalysisError;
use crate::model::ResultSet;
use reqwest::StatusCode;

pub(super) async fn read_results(resp: reqwest::Response) -> Result<ResultSet, AnalysisError> {
    let status = resp.status();
    let body = resp.text().await.map_err(AnalysisError::Network)?;

    if !status.is_success() {
        let message = server_error_message(status, &body);
        tracing::warn!(status = status.as_u16(), %message, "backend rejected analysis");
        return Err(AnalysisError::Server {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str::<ResultSet>(&body).map_err(AnalysisError::Decode)
}

/// Message for a non-2xx response.
///
/// A JSON body contributes its `detail` field when that is a string; a
/// non-JSON body is shown as raw text. Anything else falls back to
/// `Server Error: <code>`.
pub(crate) fn server_error_message(status: StatusCode, body: &str) -> String {
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => String::new(),
        },
        Err(_) => body.to_string(),
    };

    if message.is_empty() {
        format!("Server Error: {}", status.as_u16())
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_without_detail_falls_back_to_status() {
        assert_eq!(
            server_error_message(StatusCode::BAD_REQUEST, r#"{"error":"nope"}"#),
            "Server Error: 400"
        );
    }

    #[test]
    fn non_string_detail_falls_back_to_status() {
        assert_eq!(
            server_error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["body","url"],"msg":"field required"}]}"#,
            ),
            "Server Error: 422"
        );
        assert_eq!(
            server_error_message(StatusCode::BAD_REQUEST, r#"{"detail":false}"#),
            "Server Error: 400"
        );
        assert_eq!(
            server_error_message(StatusCode::BAD_REQUEST, r#"{"detail":0}"#),
            "Server Error: 400"
        );
    }

    #[test]
    fn plain_text_is_kept_verbatim() {
        assert_eq!(
            server_error_message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            "Internal Server Error"
        );
    }
}
