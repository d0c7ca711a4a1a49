use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use logsink_engine::frame::encode_frame;

use crate::config::SendArgs;
use crate::error::ServerError;

/// Build the JSON payload for one record.
pub fn build_payload(args: &SendArgs) -> Result<Vec<u8>, ServerError> {
    let mut document = Map::new();
    document.insert("service".into(), Value::String(args.service.clone()));
    document.insert("path".into(), Value::String(args.path.clone()));
    if let Some(raw) = &args.data {
        let data: Value = serde_json::from_str(raw)
            .map_err(|e| ServerError::InvalidInput(format!("--data is not valid JSON: {e}")))?;
        if !data.is_object() {
            return Err(ServerError::InvalidInput("--data must be a JSON object".into()));
        }
        document.insert("data".into(), data);
    }
    serde_json::to_vec(&Value::Object(document))
        .map_err(|e| ServerError::InvalidInput(format!("encode payload: {e}")))
}

/// Send one framed record and wait for the server to close the connection.
/// The server never answers, so a clean close is the only signal.
pub async fn run(args: &SendArgs) -> Result<(), ServerError> {
    let payload = build_payload(args)?;
    let frame = encode_frame(&payload)?;

    let mut stream = TcpStream::connect(&args.addr).await?;
    stream.write_all(&frame).await?;
    stream.shutdown().await?;

    let mut trailing = Vec::new();
    stream.read_to_end(&mut trailing).await?;

    tracing::info!(addr = %args.addr, bytes = frame.len(), "record sent");
    Ok(())
}
