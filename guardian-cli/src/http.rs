use reqwest::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::error::Error;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Decode a successful body, or turn the daemon's `{"error": ...}` reply into
/// an error carrying its message.
pub async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, Box<dyn Error>> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    Err(format!("{message} ({status})").into())
}
