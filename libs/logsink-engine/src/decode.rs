use logsink_api::Document;

use crate::error::IngestError;

/// Parse a payload as a JSON object. Scalars and arrays are rejected the
/// same way as syntax errors; nothing is salvaged from a bad payload.
pub fn parse_document(payload: &[u8]) -> Result<Document, IngestError> {
    serde_json::from_slice::<Document>(payload).map_err(|e| IngestError::MalformedPayload(e.to_string()))
}

/// Decode a payload, logging and returning `None` when it is malformed.
/// Validation turns the missing document into `MissingField`.
pub fn decode(payload: &[u8]) -> Option<Document> {
    match parse_document(payload) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::info!(error = %e, len = payload.len(), "malformed JSON message received");
            None
        }
    }
}
