/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use http::StatusCode;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpBodyType {
    ContentLength(u64),
    ReadUntilEnd,
}

#[derive(Debug, Error)]
pub enum HttpBodyReadError {
    #[error("too large body, should be less than {0}")]
    TooLargeBody(usize),
    #[error("remote closed after {0} bytes")]
    RemoteClosed(usize),
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

impl HttpBodyReadError {
    /// The status code to reply with when reading a request body failed.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            HttpBodyReadError::TooLargeBody(_) => Some(StatusCode::PAYLOAD_TOO_LARGE),
            HttpBodyReadError::RemoteClosed(_) | HttpBodyReadError::IoFailed(_) => None,
        }
    }
}

/// Read the whole body, which should not exceed `max_size`.
pub async fn read_body<R>(
    reader: &mut R,
    body_type: HttpBodyType,
    max_size: usize,
) -> Result<Vec<u8>, HttpBodyReadError>
where
    R: AsyncRead + Unpin,
{
    match body_type {
        HttpBodyType::ContentLength(size) => {
            let size = usize::try_from(size)
                .ok()
                .filter(|v| *v <= max_size)
                .ok_or(HttpBodyReadError::TooLargeBody(max_size))?;
            let mut buf = Vec::with_capacity(size);
            let nr = (&mut *reader).take(size as u64).read_to_end(&mut buf).await?;
            if nr < size {
                return Err(HttpBodyReadError::RemoteClosed(nr));
            }
            Ok(buf)
        }
        HttpBodyType::ReadUntilEnd => {
            let mut buf = Vec::new();
            (&mut *reader)
                .take(max_size as u64 + 1)
                .read_to_end(&mut buf)
                .await?;
            if buf.len() > max_size {
                return Err(HttpBodyReadError::TooLargeBody(max_size));
            }
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::io::Result;
    use tokio_util::io::StreamReader;

    fn reader(content: &'static [u8]) -> impl AsyncRead + Unpin {
        StreamReader::new(tokio_stream::iter(vec![Result::Ok(Bytes::from_static(
            content,
        ))]))
    }

    #[tokio::test]
    async fn content_length() {
        let mut r = reader(b"Hello, world!trailing");
        let body = read_body(&mut r, HttpBodyType::ContentLength(13), 1024)
            .await
            .unwrap();
        assert_eq!(body, b"Hello, world!");
    }

    #[tokio::test]
    async fn content_length_closed() {
        let mut r = reader(b"Hello");
        let e = read_body(&mut r, HttpBodyType::ContentLength(13), 1024)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpBodyReadError::RemoteClosed(5)));
        assert_eq!(e.status_code(), None);
    }

    #[tokio::test]
    async fn content_length_too_large() {
        let mut r = reader(b"Hello, world!");
        let e = read_body(&mut r, HttpBodyType::ContentLength(13), 8)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpBodyReadError::TooLargeBody(8)));
        assert_eq!(e.status_code(), Some(StatusCode::PAYLOAD_TOO_LARGE));
    }

    #[tokio::test]
    async fn read_until_end() {
        let mut r = reader(b"Hello, world!");
        let body = read_body(&mut r, HttpBodyType::ReadUntilEnd, 13)
            .await
            .unwrap();
        assert_eq!(body, b"Hello, world!");

        let mut r = reader(b"Hello, world!");
        let e = read_body(&mut r, HttpBodyType::ReadUntilEnd, 12)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpBodyReadError::TooLargeBody(12)));
    }
}
