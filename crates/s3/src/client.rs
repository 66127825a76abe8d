//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from fsg-core.

use std::io;

use async_trait::async_trait;
use aws_sdk_s3::config::{RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::Object;
use aws_smithy_types::byte_stream::ByteStream as SdkByteStream;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use http_body::Frame;
use http_body_util::StreamBody;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use fsg_core::{BackendEndpoint, ByteStream, Error, ObjectInfo, ObjectStore, Result, StorageConfig};

use crate::multipart::{self, MultipartConfig, MAX_SINGLE_PUT_SIZE};

/// Chunks buffered between the caller's body and the SDK request body
const BODY_CHANNEL_DEPTH: usize = 8;

/// S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    multipart: MultipartConfig,
}

impl S3Client {
    /// Create a new S3 client bound to an endpoint with static credentials
    pub async fn new(config: &StorageConfig, endpoint: BackendEndpoint) -> Result<Self> {
        let url = endpoint.url()?;

        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "fsg-static-credentials",
        );

        // Build SDK config
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(endpoint.region))
            .endpoint_url(url.as_str().trim_end_matches('/'))
            .load()
            .await;

        // Path-style addressing and on-demand checksums keep non-AWS backends happy
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        let client = aws_sdk_s3::Client::from_conf(s3_config);

        tracing::debug!(endpoint = %url, region = endpoint.region, "S3 client configured");

        Ok(Self {
            inner: client,
            multipart: MultipartConfig::default(),
        })
    }

    /// Override the part size used for uploads of unknown length
    pub fn with_multipart(mut self, multipart: MultipartConfig) -> Self {
        self.multipart = multipart;
        self
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Single PutObject whose body is forwarded chunk by chunk
    async fn put_streaming(
        &self,
        bucket: &str,
        key: &str,
        mut body: ByteStream,
        length: u64,
    ) -> Result<()> {
        // The SDK wants a Sync body; a channel receiver is one.
        let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(BODY_CHANNEL_DEPTH);
        let frames = ReceiverStream::new(rx).map_ok(Frame::data);
        let content_length = i64::try_from(length)
            .map_err(|_| Error::General(format!("payload too large: {length} bytes")))?;

        let request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(content_length)
            .body(SdkByteStream::from_body_1_x(StreamBody::new(frames)))
            .send();

        let pump = async move {
            while let Some(chunk) = body.next().await {
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        };

        let (response, ()) = tokio::join!(request, pump);
        response.map_err(|e| map_sdk_error(e, key))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(body_stream(response.body))
    }

    fn list_objects(&self, bucket: &str) -> BoxStream<'static, Result<ObjectInfo>> {
        let pages = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();
        let bucket = bucket.to_string();

        stream::unfold(pages, |mut pages| async move {
            pages.next().await.map(|page| (page, pages))
        })
        .map(move |page| page.map_err(|e| map_sdk_error(e, &bucket)))
        .map_ok(|page| {
            let items: Vec<Result<ObjectInfo>> =
                page.contents().iter().map(object_info).map(Ok).collect();
            stream::iter(items)
        })
        .try_flatten()
        .boxed()
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        length: Option<u64>,
    ) -> Result<()> {
        match length {
            Some(length) if length <= MAX_SINGLE_PUT_SIZE => {
                self.put_streaming(bucket, key, body, length).await
            }
            Some(length) => {
                let config = self
                    .multipart
                    .clone()
                    .part_size(self.multipart.calculate_part_size(length));
                multipart::upload(&self.inner, bucket, key, body, &config).await
            }
            None => multipart::upload(&self.inner, bucket, key, body, &self.multipart).await,
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        match self.inner.delete_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(()),
            Err(e) => match map_sdk_error(e, key) {
                err if err.is_not_found() => Ok(()),
                err => Err(err),
            },
        }
    }
}

/// Translate an SDK failure into the core error type
///
/// Only a missing object is distinguished; everything else is reported as
/// a transport failure with the full error chain as message.
pub(crate) fn map_sdk_error<E>(err: E, key: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if is_not_found_code(err.code()) {
        Error::NotFound(key.to_string())
    } else {
        Error::Network(DisplayErrorContext(&err).to_string())
    }
}

fn is_not_found_code(code: Option<&str>) -> bool {
    matches!(code, Some("NoSuchKey" | "NotFound"))
}

/// Adapt an SDK response body into a plain byte stream
fn body_stream(body: SdkByteStream) -> ByteStream {
    stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(io::Error::other), body))
    })
    .boxed()
}

fn object_info(object: &Object) -> ObjectInfo {
    let key = object.key().unwrap_or_default();
    let size = object.size().unwrap_or(0).max(0) as u64;
    let mut info = ObjectInfo::file(key, size);

    if let Some(modified) = object.last_modified() {
        info.last_modified = jiff::Timestamp::from_nanosecond(modified.as_nanos()).ok();
    }

    if let Some(etag) = object.e_tag() {
        info.etag = Some(etag.trim_matches('"').to_string());
    }

    info
}
