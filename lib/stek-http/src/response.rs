/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use thiserror::Error;
use tokio::io::AsyncBufRead;

use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpStatusLine};

#[derive(Debug, Error)]
pub enum HttpResponseParseError {
    #[error("remote closed")]
    RemoteClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid version {0:?}")]
    InvalidVersion(Version),
    #[error("invalid status line: {0}")]
    InvalidStatusLine(HttpLineParseError),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("unsupported transfer-encoding")]
    UnsupportedTransferEncoding,
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

#[derive(Debug)]
pub struct HttpResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    origin_header_size: usize,
    keep_alive: bool,
    content_length: u64,
    has_content_length: bool,
}

impl HttpResponseHead {
    fn new(version: Version, code: u16, reason: String) -> Self {
        HttpResponseHead {
            version,
            code,
            reason,
            headers: HeaderMap::new(),
            origin_header_size: 0,
            keep_alive: version == Version::HTTP_11,
            content_length: 0,
            has_content_length: false,
        }
    }

    /// Build an outgoing response, the body length is always set.
    pub fn new_outgoing(status: StatusCode, content_length: u64, keep_alive: bool) -> Self {
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let mut rsp = HttpResponseHead::new(Version::HTTP_11, status.as_u16(), reason);
        rsp.keep_alive = keep_alive;
        rsp.content_length = content_length;
        rsp.has_content_length = true;
        rsp
    }

    pub fn origin_header_size(&self) -> usize {
        self.origin_header_size
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Get the value of the first header with this name, if it is valid utf-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn expect_no_body(&self, method: &Method) -> bool {
        self.code < 200 || self.code == 204 || self.code == 304 || method.eq(&Method::HEAD)
    }

    pub fn body_type(&self, method: &Method) -> Option<HttpBodyType> {
        if self.expect_no_body(method) {
            None
        } else if self.has_content_length {
            if self.content_length > 0 {
                Some(HttpBodyType::ContentLength(self.content_length))
            } else {
                None
            }
        } else {
            Some(HttpBodyType::ReadUntilEnd)
        }
    }

    pub async fn parse<R>(
        reader: &mut R,
        method: &Method,
        max_header_size: usize,
    ) -> Result<Self, HttpResponseParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        let (found, nr) =
            crate::limited_read_until(reader, b'\n', max_header_size, &mut line_buf).await?;
        if nr == 0 {
            return Err(HttpResponseParseError::RemoteClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpResponseParseError::RemoteClosed)
            } else {
                Err(HttpResponseParseError::TooLargeHeader(max_header_size))
            };
        }
        header_size += nr;

        let mut rsp = HttpResponseHead::build_from_status_line(line_buf.as_ref())?;

        loop {
            if header_size >= max_header_size {
                return Err(HttpResponseParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) =
                crate::limited_read_until(reader, b'\n', max_len, &mut line_buf).await?;
            if nr == 0 {
                return Err(HttpResponseParseError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpResponseParseError::RemoteClosed)
                } else {
                    Err(HttpResponseParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if crate::is_header_end_line(&line_buf) {
                break;
            }

            rsp.parse_header_line(line_buf.as_ref())?;
        }
        rsp.origin_header_size = header_size;

        if !rsp.expect_no_body(method) && !rsp.has_content_length {
            // read to end and close the connection
            rsp.keep_alive = false;
        }
        Ok(rsp)
    }

    fn build_from_status_line(line_buf: &[u8]) -> Result<Self, HttpResponseParseError> {
        let rsp =
            HttpStatusLine::parse(line_buf).map_err(HttpResponseParseError::InvalidStatusLine)?;
        let version = match rsp.version {
            0 => Version::HTTP_10,
            1 => Version::HTTP_11,
            _ => return Err(HttpResponseParseError::InvalidVersion(Version::HTTP_2)),
        };

        Ok(HttpResponseHead::new(version, rsp.code, rsp.reason.to_string()))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpResponseParseError> {
        let header =
            HttpHeaderLine::parse(line_buf).map_err(HttpResponseParseError::InvalidHeaderLine)?;
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "connection" => {
                for v in header.value.split(',') {
                    let v = v.trim();
                    if v.eq_ignore_ascii_case("close") {
                        self.keep_alive = false;
                    } else if v.eq_ignore_ascii_case("keep-alive") {
                        self.keep_alive = true;
                    }
                }
                return Ok(());
            }
            "transfer-encoding" => {
                return Err(HttpResponseParseError::UnsupportedTransferEncoding);
            }
            "content-length" => {
                let content_length = u64::from_str(header.value)
                    .map_err(|_| HttpResponseParseError::InvalidContentLength)?;
                if self.has_content_length && self.content_length != content_length {
                    return Err(HttpResponseParseError::InvalidContentLength);
                }
                self.has_content_length = true;
                self.content_length = content_length;
                return Ok(());
            }
            _ => {}
        }

        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::<u8>::with_capacity(256);
        let _ = write!(buf, "{:?} {} {}\r\n", self.version, self.code, self.reason);
        for (name, value) in &self.headers {
            buf.extend_from_slice(name.as_str().as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(crate::CRLF);
        }
        if self.has_content_length {
            let mut b = itoa::Buffer::new();
            buf.extend_from_slice(b"Content-Length: ");
            buf.extend_from_slice(b.format(self.content_length).as_bytes());
            buf.extend_from_slice(crate::CRLF);
        }
        if self.keep_alive {
            buf.extend_from_slice(b"Connection: keep-alive\r\n");
        } else {
            buf.extend_from_slice(b"Connection: close\r\n");
        }
        buf.extend_from_slice(crate::CRLF);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::io::{BufReader, Result};
    use tokio_util::io::StreamReader;

    async fn parse(
        content: &'static [u8],
        method: &Method,
    ) -> std::result::Result<HttpResponseHead, HttpResponseParseError> {
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);
        HttpResponseHead::parse(&mut buf_stream, method, 4096).await
    }

    #[tokio::test]
    async fn read_get() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            Content-Length: 4\r\n\
            X-Session-Reused: true\r\n\
            Connection: keep-alive\r\n\r\n";
        let method = Method::GET;
        let rsp = parse(content, &method).await.unwrap();
        assert_eq!(rsp.code, 200);
        assert_eq!(rsp.reason, "OK");
        assert!(rsp.keep_alive());
        assert_eq!(rsp.header_str("x-session-reused"), Some("true"));
        assert_eq!(rsp.body_type(&method), Some(HttpBodyType::ContentLength(4)));
    }

    #[tokio::test]
    async fn read_get_to_end() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\r\n";
        let method = Method::GET;
        let rsp = parse(content, &method).await.unwrap();
        assert!(!rsp.keep_alive());
        assert_eq!(rsp.body_type(&method), Some(HttpBodyType::ReadUntilEnd));
    }

    #[tokio::test]
    async fn read_no_body() {
        let content = b"HTTP/1.1 204 No Content\r\n\r\n";
        let rsp = parse(content, &Method::GET).await.unwrap();
        assert!(rsp.keep_alive());
        assert_eq!(rsp.body_type(&Method::GET), None);

        let content = b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n";
        let rsp = parse(content, &Method::HEAD).await.unwrap();
        assert_eq!(rsp.body_type(&Method::HEAD), None);
    }

    #[tokio::test]
    async fn read_invalid() {
        let e = parse(b"HTTP/1.1 200 OK\r\n", &Method::GET)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpResponseParseError::RemoteClosed));

        let e = parse(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
            &Method::GET,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            e,
            HttpResponseParseError::UnsupportedTransferEncoding
        ));

        let e = parse(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n",
            &Method::GET,
        )
        .await
        .unwrap_err();
        assert!(matches!(e, HttpResponseParseError::InvalidContentLength));
    }

    #[tokio::test]
    async fn read_overflow_status_code() {
        let e = parse(b"HTTP/1.1 99999 OK\r\n\r\n", &Method::GET)
            .await
            .unwrap_err();
        assert!(matches!(
            e,
            HttpResponseParseError::InvalidStatusLine(HttpLineParseError::InvalidStatusCode)
        ));
    }

    #[test]
    fn serialize() {
        let mut rsp = HttpResponseHead::new_outgoing(StatusCode::OK, 5, false);
        rsp.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        assert_eq!(
            rsp.serialize(),
            b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\n"
        );
    }
}
