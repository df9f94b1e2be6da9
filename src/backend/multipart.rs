use super::AnalysisError;
use crate::model::AnalysisInput;
use reqwest::multipart::{Form, Part};

const PDF_MIME: &str = "application/pdf";

/// Build the request payload: a `url` text part or a `file` binary part.
pub(super) async fn build_form(input: &AnalysisInput) -> Result<Form, AnalysisError> {
    match input {
        // Sent exactly as typed; only the emptiness check trims.
        AnalysisInput::Url(url) => Ok(Form::new().text("url", url.clone())),
        AnalysisInput::File(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| AnalysisError::File {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "read upload");

            let part = Part::bytes(bytes)
                .file_name(input.source_label())
                .mime_str(PDF_MIME)
                .map_err(AnalysisError::Network)?;
            Ok(Form::new().part("file", part))
        }
    }
}
