//! Multipart upload support
//!
//! Uploads whose size is not known up front (or that exceed the single
//! PutObject limit) are cut into parts. Only one part is held in memory
//! at a time.

use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use fsg_core::{ByteStream, Error, Result};

use crate::client::map_sdk_error;

/// Default part size: 8 MiB
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Largest object a single PutObject may carry: 5 GiB
pub const MAX_SINGLE_PUT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes
    pub part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    /// Calculate appropriate part size for an object of known size
    pub fn calculate_part_size(&self, file_size: u64) -> u64 {
        // If file fits in one part, use minimum
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        // Calculate parts needed with current size
        let parts = file_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            // Need larger parts to fit within 10,000 limit
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Cuts a byte stream into fixed-size parts
pub(crate) struct PartReader {
    body: ByteStream,
    buffer: BytesMut,
    done: bool,
}

impl PartReader {
    pub(crate) fn new(body: ByteStream) -> Self {
        Self {
            body,
            buffer: BytesMut::new(),
            done: false,
        }
    }

    /// Next part of at most `part_size` bytes; None once the body is drained
    ///
    /// Every part except the last is exactly `part_size` long.
    pub(crate) async fn next_part(&mut self, part_size: usize) -> Result<Option<Bytes>> {
        while !self.done && self.buffer.len() < part_size {
            match self.body.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => self.done = true,
            }
        }

        if self.buffer.is_empty() {
            return Ok(None);
        }

        let take = part_size.min(self.buffer.len());
        Ok(Some(self.buffer.split_to(take).freeze()))
    }

    /// Whether the body ended and every byte was handed out
    pub(crate) fn is_exhausted(&self) -> bool {
        self.done && self.buffer.is_empty()
    }
}

/// Upload a body of unknown length
///
/// A body shorter than one part goes out as a single PutObject. Longer
/// bodies use a multipart upload, which is aborted if any step fails.
pub async fn upload(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: ByteStream,
    config: &MultipartConfig,
) -> Result<()> {
    let part_size = usize::try_from(config.part_size)
        .map_err(|_| Error::General(format!("part size {} too large", config.part_size)))?;
    let mut reader = PartReader::new(body);
    let first = reader.next_part(part_size).await?.unwrap_or_default();

    if reader.is_exhausted() {
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(SdkByteStream::from(first))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        return Ok(());
    }

    let created = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, key))?;
    let upload_id = created
        .upload_id()
        .ok_or_else(|| Error::General("backend returned no upload id".into()))?
        .to_string();

    tracing::debug!(key, upload_id = %upload_id, part_size, "multipart upload started");

    match upload_parts(client, bucket, key, &upload_id, first, &mut reader, part_size).await {
        Ok(parts) => {
            let completed = CompletedMultipartUpload::builder()
                .set_parts(Some(parts))
                .build();
            client
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .multipart_upload(completed)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, key))?;
            Ok(())
        }
        Err(e) => {
            if let Err(abort_err) = client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(
                    key,
                    upload_id = %upload_id,
                    "Failed to abort multipart upload: {}",
                    map_sdk_error(abort_err, key)
                );
            }
            Err(e)
        }
    }
}

async fn upload_parts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    first: Bytes,
    reader: &mut PartReader,
    part_size: usize,
) -> Result<Vec<CompletedPart>> {
    let mut parts = Vec::new();
    let mut next = Some(first);

    while let Some(data) = next {
        if parts.len() >= MAX_PARTS {
            return Err(Error::General(format!(
                "upload exceeds {MAX_PARTS} parts of {part_size} bytes"
            )));
        }
        let part_number = parts.len() as i32 + 1;

        let response = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        parts.push(
            CompletedPart::builder()
                .part_number(part_number)
                .set_e_tag(response.e_tag().map(str::to_string))
                .build(),
        );

        next = reader.next_part(part_size).await?;
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn body_of(chunks: &[&'static [u8]]) -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(*c)))
            .collect();
        stream::iter(items).boxed()
    }

    #[test]
    fn test_default_config() {
        let config = MultipartConfig::new();
        assert_eq!(config.part_size, DEFAULT_PART_SIZE);
    }

    #[test]
    fn test_part_size_clamping() {
        let config = MultipartConfig::new().part_size(1024);
        assert_eq!(config.part_size, MIN_PART_SIZE);

        let config = MultipartConfig::new().part_size(10 * 1024 * 1024 * 1024);
        assert_eq!(config.part_size, MAX_PART_SIZE);
    }

    #[test]
    fn test_calculate_part_size_small_file() {
        let config = MultipartConfig::new();
        assert_eq!(config.calculate_part_size(1024), MIN_PART_SIZE);
    }

    #[test]
    fn test_calculate_part_size_large_file() {
        let config = MultipartConfig::new();
        // 6 GiB fits in 10,000 parts of 8 MiB
        let file_size = 6 * 1024 * 1024 * 1024;
        assert_eq!(config.calculate_part_size(file_size), DEFAULT_PART_SIZE);

        // 1 TiB does not
        let file_size: u64 = 1024 * 1024 * 1024 * 1024;
        let part_size = config.calculate_part_size(file_size);
        assert!(part_size > DEFAULT_PART_SIZE);
        assert!(file_size.div_ceil(part_size) <= MAX_PARTS as u64);
    }

    #[tokio::test]
    async fn test_part_reader_splits_across_chunks() {
        let mut reader = PartReader::new(body_of(&[b"abc", b"defgh", b"ij"]));

        assert_eq!(reader.next_part(4).await.unwrap().unwrap(), "abcd");
        assert_eq!(reader.next_part(4).await.unwrap().unwrap(), "efgh");
        assert_eq!(reader.next_part(4).await.unwrap().unwrap(), "ij");
        assert!(reader.is_exhausted());
        assert!(reader.next_part(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_part_reader_short_body() {
        let mut reader = PartReader::new(body_of(&[b"hello"]));
        assert_eq!(reader.next_part(16).await.unwrap().unwrap(), "hello");
        assert!(reader.is_exhausted());
    }

    #[tokio::test]
    async fn test_part_reader_empty_body() {
        let mut reader = PartReader::new(body_of(&[]));
        assert!(reader.next_part(16).await.unwrap().is_none());
        assert!(reader.is_exhausted());
    }

    #[tokio::test]
    async fn test_part_reader_propagates_stream_error() {
        let items: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(std::io::Error::other("client went away")),
        ];
        let mut reader = PartReader::new(stream::iter(items).boxed());
        assert!(matches!(reader.next_part(16).await, Err(Error::Io(_))));
    }
}
