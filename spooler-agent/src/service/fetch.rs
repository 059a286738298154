//! Artifact fetcher
//!
//! Downloads a label into a uniquely named temporary file. The returned
//! `NamedTempFile` owns the file; dropping it deletes it.

use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::PrintError;

/// Resolves `http(s)://` and `file://` label URLs to local files
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
    temp_dir: Option<PathBuf>,
}

impl ArtifactFetcher {
    /// Creates a fetcher whose downloads time out after `timeout`
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            temp_dir: None,
        }
    }

    /// Places temporary files in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Fetches `label_url` into a `label-*.pdf` temporary file
    pub async fn fetch(&self, label_url: &str) -> Result<NamedTempFile, PrintError> {
        let url = parse_label_url(label_url)?;

        let bytes = if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| PrintError::InvalidUrl(label_url.to_string()))?;
            tokio::fs::read(&path)
                .await
                .map_err(|e| PrintError::Fetch(format!("{}: {}", path.display(), e)))?
        } else {
            self.download(url).await?
        };

        if bytes.is_empty() {
            return Err(PrintError::Fetch(format!("{} returned an empty document", label_url)));
        }

        let file = self.temp_file()?;
        tokio::fs::write(file.path(), &bytes).await?;
        debug!(
            "Fetched {} bytes from {} into {}",
            bytes.len(),
            label_url,
            file.path().display()
        );

        Ok(file)
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, PrintError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn temp_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("label-").suffix(".pdf");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

/// Parses a label URL the fetcher can resolve
pub fn parse_label_url(label_url: &str) -> Result<Url, PrintError> {
    let url = Url::parse(label_url)
        .map_err(|e| PrintError::InvalidUrl(format!("{}: {}", label_url, e)))?;

    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        other => Err(PrintError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fetcher(dir: &TempDir) -> ArtifactFetcher {
        ArtifactFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_temp_dir(dir.path())
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let source = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let label = source.path().join("label.pdf");
        std::fs::write(&label, b"%PDF-1.4 test").unwrap();
        let url = Url::from_file_path(&label).unwrap();

        let file = fetcher(&scratch).fetch(url.as_str()).await.unwrap();

        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("label-") && name.ends_with(".pdf"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"%PDF-1.4 test");

        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_rejects_bad_urls() {
        let scratch = TempDir::new().unwrap();
        let fetcher = fetcher(&scratch);

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, PrintError::InvalidUrl(_)));

        let err = fetcher.fetch("ftp://example.com/a.pdf").await.unwrap_err();
        assert!(matches!(err, PrintError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_missing_and_empty_files_are_transient() {
        let source = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let fetcher = fetcher(&scratch);

        let missing = Url::from_file_path(source.path().join("nope.pdf")).unwrap();
        let err = fetcher.fetch(missing.as_str()).await.unwrap_err();
        assert!(err.is_transient());

        let empty = source.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        let url = Url::from_file_path(&empty).unwrap();
        let err = fetcher.fetch(url.as_str()).await.unwrap_err();
        assert!(matches!(err, PrintError::Fetch(_)));

        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
