//! Drive v3 REST client

use super::traits::{ByteStream, RemoteStorage};
use crate::config::DriveConfig;
use crate::error::{Error, Result};
use crate::types::{FileId, FileList, RemoteFile};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, future, stream};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::io::{ReaderStream, StreamReader};
use url::Url;

/// Metadata fields requested for every file
const FILE_FIELDS: &str = "id,name,mimeType,parents,createdTime,modifiedTime,size";

/// Fields requested for each listing page
const LIST_FIELDS: &str =
    "nextPageToken,files(id,name,mimeType,parents,createdTime,modifiedTime,size)";

/// Random characters after the boundary prefix
const BOUNDARY_LEN: usize = 32;

/// Downloaded chunks buffered ahead of the reader
const DOWNLOAD_BUFFER_CHUNKS: usize = 16;

/// Remote storage backed by the Drive v3 REST API
///
/// Every request carries the bearer token supplied at construction. Obtaining
/// and refreshing that token is the host application's job.
///
/// # Examples
///
/// ```no_run
/// use drive_gateway::config::DriveConfig;
/// use drive_gateway::storage::DriveClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DriveClient::new(&DriveConfig::default(), "ya29.access-token")?;
/// # Ok(())
/// # }
/// ```
pub struct DriveClient {
    http: reqwest::Client,
    api_base: Url,
    upload_base: Url,
    access_token: String,
    page_size: u32,
}

/// One page of a `files.list` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<RemoteFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl DriveClient {
    /// Create a client for the endpoints in `config`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a base URL cannot be parsed, or
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: &DriveConfig, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            api_base: parse_base(&config.api_base_url, "api_base_url")?,
            upload_base: parse_base(&config.upload_base_url, "upload_base_url")?,
            access_token: access_token.into(),
            page_size: config.page_size,
        })
    }

    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config {
                message: format!("base URL '{}' cannot take path segments", base),
                key: None,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = error_for_status(request.send().await?).await?;
        let body = response.text().await?;
        decode_body(&body)
    }
}

/// Parse a Drive response body; a body that is not the expected JSON is an
/// I/O failure of the service, not a local serialization bug
fn decode_body<T>(body: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, "unparseable Drive response");
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("malformed Drive response: {e}"),
        ))
    })
}

fn parse_base(value: &str, key: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config {
        message: format!("invalid URL '{}': {}", value, e),
        key: Some(key.to_string()),
    })
}

/// Turn a non-success response into [`Error::Api`]
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "Drive request failed");
    Err(Error::from_api_response(status.as_u16(), &body))
}

fn multipart_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LEN)
        .map(char::from)
        .collect();
    format!("drive_gateway_{token}")
}

/// Response body chunks handed over from the forwarding task
struct ChunkReceiver(mpsc::Receiver<std::io::Result<Bytes>>);

impl Stream for ChunkReceiver {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.poll_recv(cx)
    }
}

/// Pump a response body into `tx`, stopping at the first failure or once the reader is dropped
async fn forward_body(response: reqwest::Response, tx: mpsc::Sender<std::io::Result<Bytes>>) {
    let mut body = std::pin::pin!(response.bytes_stream());
    while let Some(chunk) = body.next().await {
        let failed = chunk.is_err();
        if tx.send(chunk.map_err(std::io::Error::other)).await.is_err() || failed {
            break;
        }
    }
}

#[async_trait]
impl RemoteStorage for DriveClient {
    async fn create_file(
        &self,
        metadata: &RemoteFile,
        content: ByteStream,
    ) -> Result<Option<RemoteFile>> {
        let url = Self::endpoint(&self.upload_base, &["files"])?;
        let boundary = multipart_boundary();
        let media_type = metadata
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        // multipart/related: JSON metadata part, then the streamed media part
        let mut head = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"
        )
        .into_bytes();
        head.extend(serde_json::to_vec(metadata)?);
        head.extend(format!("\r\n--{boundary}\r\nContent-Type: {media_type}\r\n\r\n").into_bytes());
        let tail = Bytes::from(format!("\r\n--{boundary}--\r\n"));

        let body = stream::once(future::ready(Ok::<_, std::io::Error>(Bytes::from(head))))
            .chain(ReaderStream::new(content))
            .chain(stream::once(future::ready(Ok(tail))));

        tracing::debug!(name = %metadata.name, url = %url, "uploading file to Drive");

        let response = self
            .http
            .post(url)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .bearer_auth(&self.access_token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode_body(&body).map(Some)
    }

    async fn list_files(&self, spaces: &str) -> Result<FileList> {
        let url = Self::endpoint(&self.api_base, &["files"])?;
        let page_size = self.page_size.to_string();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0u32;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(&self.access_token)
                .query(&[
                    ("spaces", spaces),
                    ("pageSize", page_size.as_str()),
                    ("fields", LIST_FIELDS),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileListPage = self.send_json(request).await?;
            pages += 1;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        tracing::warn!(token = %token, pages, "Drive repeated a page token, stopping listing");
                        break;
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(spaces, pages, files = files.len(), "listed Drive files");
        Ok(FileList { files })
    }

    async fn get_file(&self, id: &FileId) -> Result<RemoteFile> {
        let url = Self::endpoint(&self.api_base, &["files", id.as_str()])?;
        tracing::debug!(file_id = %id, "fetching Drive file metadata");

        let request = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", FILE_FIELDS)]);
        self.send_json(request).await
    }

    async fn download(&self, id: &FileId) -> Result<ByteStream> {
        let url = Self::endpoint(&self.api_base, &["files", id.as_str()])?;
        tracing::debug!(file_id = %id, "downloading Drive file content");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let (tx, rx) = mpsc::channel(DOWNLOAD_BUFFER_CHUNKS);
        tokio::spawn(forward_body(response, tx));
        Ok(Box::new(StreamReader::new(ChunkReceiver(rx))))
    }

    fn name(&self) -> &'static str {
        "drive-v3"
    }
}
