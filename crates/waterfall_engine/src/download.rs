use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use futures_util::StreamExt;

use crate::filename::download_filename;
use crate::storage::AtomicFileWriter;
use crate::DownloadError;

/// Best-effort fetch-and-save of a finished item's media.
#[async_trait::async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, url: &str, prompt: &str) -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    client: reqwest::Client,
    writer: AtomicFileWriter,
}

impl ReqwestDownloader {
    pub fn new(dir: PathBuf, connect_timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self {
            client,
            writer: AtomicFileWriter::new(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }
}

#[async_trait::async_trait]
impl MediaDownloader for ReqwestDownloader {
    async fn download(&self, url: &str, prompt: &str) -> Result<PathBuf, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DownloadError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        let filename = download_filename(prompt, url);
        let mut file = self.writer.begin(&filename)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| DownloadError::Network(err.to_string()))?;
            file.write_chunk(&chunk)?;
        }
        engine_debug!("Downloaded {} bytes from {}", file.written(), url);
        let path = file.commit()?;
        engine_info!("Saved download to {}", path.display());
        Ok(path)
    }
}
