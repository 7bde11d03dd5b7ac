use crate::error::ReaderError;
use crate::utils::text::decode_text;
use std::path::PathBuf;

/// Where raw book text comes from. Each book is a `<id>.txt` file.
#[derive(Debug, Clone)]
pub enum ContentSource {
    Directory(PathBuf),
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

impl ContentSource {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        ContentSource::Directory(path.into())
    }

    pub fn http(base_url: impl Into<String>) -> Self {
        ContentSource::Http {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch(&self, book_id: u32) -> Result<String, ReaderError> {
        let bytes = match self {
            ContentSource::Directory(dir) => {
                let path = dir.join(format!("{book_id}.txt"));
                match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(ReaderError::ContentNotFound(book_id));
                    }
                    Err(e) => {
                        return Err(ReaderError::LoadFailed(format!("{}: {}", path.display(), e)));
                    }
                }
            }
            ContentSource::Http { client, base_url } => {
                let url = format!("{base_url}/{book_id}.txt");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ReaderError::LoadFailed(e.to_string()))?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(ReaderError::ContentNotFound(book_id));
                }
                if !response.status().is_success() {
                    return Err(ReaderError::LoadFailed(format!(
                        "{url} returned {}",
                        response.status()
                    )));
                }
                response
                    .bytes()
                    .await
                    .map_err(|e| ReaderError::LoadFailed(e.to_string()))?
                    .to_vec()
            }
        };

        tracing::debug!("Fetched {} bytes of content for book {}", bytes.len(), book_id);
        decode_text(&bytes).map_err(|e| ReaderError::LoadFailed(e.to_string()))
    }
}
