use bytes::Bytes;
use reqwest::Client;

use crate::error::AppError;

/// Downloads an uploaded file from its signed URL, refusing bodies over `max_bytes`.
pub async fn load_file_from_url(client: &Client, url: &str, max_bytes: usize) -> Result<Bytes, AppError> {
    let start = std::time::Instant::now();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::FileRead(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::FileRead(format!(
            "Failed to fetch file. Status: {}",
            response.status()
        )));
    }

    if let Some(length) = response.content_length() {
        check_size(length as usize, max_bytes)?;
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::FileRead(format!("Failed to read response bytes: {}", e)))?;
    check_size(bytes.len(), max_bytes)?;

    tracing::info!("Downloaded {}KB in {:?}", bytes.len() / 1024, start.elapsed());
    Ok(bytes)
}

fn check_size(size: usize, max_bytes: usize) -> Result<(), AppError> {
    if size > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "File is {} bytes, the limit is {} bytes",
            size, max_bytes
        )));
    }
    Ok(())
}
