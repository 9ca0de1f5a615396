/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version, header};
use thiserror::Error;
use tokio::io::AsyncBufRead;

use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpRequestLine};

#[derive(Debug, Error)]
pub enum HttpRequestParseError {
    #[error("client closed")]
    ClientClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid request line: {0}")]
    InvalidRequestLine(HttpLineParseError),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("unsupported version: {0:?}")]
    UnsupportedVersion(Version),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("unsupported transfer-encoding")]
    UnsupportedTransferEncoding,
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

impl HttpRequestParseError {
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            HttpRequestParseError::IoFailed(_) | HttpRequestParseError::ClientClosed => None,
            HttpRequestParseError::TooLargeHeader(_) => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            HttpRequestParseError::UnsupportedMethod(_)
            | HttpRequestParseError::UnsupportedTransferEncoding => {
                Some(StatusCode::NOT_IMPLEMENTED)
            }
            HttpRequestParseError::UnsupportedVersion(_) => {
                Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
            }
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

#[derive(Debug)]
pub struct HttpRequestHead {
    pub version: Version,
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub host: Option<String>,
    origin_header_size: usize,
    keep_alive: bool,
    content_length: u64,
    has_content_length: bool,
}

impl HttpRequestHead {
    fn new(method: Method, uri: String, version: Version) -> Self {
        HttpRequestHead {
            keep_alive: version == Version::HTTP_11,
            version,
            method,
            uri,
            headers: HeaderMap::new(),
            host: None,
            origin_header_size: 0,
            content_length: 0,
            has_content_length: false,
        }
    }

    /// Build an outgoing request with no body.
    pub fn new_outgoing(method: Method, uri: &str, host: &str) -> Self {
        let mut req = HttpRequestHead::new(method, uri.to_string(), Version::HTTP_11);
        req.host = Some(host.to_string());
        req
    }

    pub fn origin_header_size(&self) -> usize {
        self.origin_header_size
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn set_no_keep_alive(&mut self) {
        self.keep_alive = false;
    }

    pub fn body_type(&self) -> Option<HttpBodyType> {
        if self.has_content_length && self.content_length > 0 {
            Some(HttpBodyType::ContentLength(self.content_length))
        } else {
            None
        }
    }

    pub async fn parse<R>(
        reader: &mut R,
        max_header_size: usize,
    ) -> Result<Self, HttpRequestParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        let (found, nr) =
            crate::limited_read_until(reader, b'\n', max_header_size, &mut line_buf).await?;
        if nr == 0 {
            return Err(HttpRequestParseError::ClientClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpRequestParseError::ClientClosed)
            } else {
                Err(HttpRequestParseError::TooLargeHeader(max_header_size))
            };
        }
        header_size += nr;

        let mut req = HttpRequestHead::build_from_request_line(line_buf.as_ref())?;

        loop {
            if header_size >= max_header_size {
                return Err(HttpRequestParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) =
                crate::limited_read_until(reader, b'\n', max_len, &mut line_buf).await?;
            if nr == 0 {
                return Err(HttpRequestParseError::ClientClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpRequestParseError::ClientClosed)
                } else {
                    Err(HttpRequestParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if crate::is_header_end_line(&line_buf) {
                break;
            }

            req.parse_header_line(line_buf.as_ref())?;
        }
        req.origin_header_size = header_size;

        Ok(req)
    }

    fn build_from_request_line(line_buf: &[u8]) -> Result<Self, HttpRequestParseError> {
        let req =
            HttpRequestLine::parse(line_buf).map_err(HttpRequestParseError::InvalidRequestLine)?;

        let version = match req.version {
            0 => Version::HTTP_10,
            1 => Version::HTTP_11,
            _ => return Err(HttpRequestParseError::UnsupportedVersion(Version::HTTP_2)),
        };

        let method = match req.method {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            s => return Err(HttpRequestParseError::UnsupportedMethod(s.to_string())),
        };

        Ok(HttpRequestHead::new(method, req.uri.to_string(), version))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpRequestParseError> {
        let header =
            HttpHeaderLine::parse(line_buf).map_err(HttpRequestParseError::InvalidHeaderLine)?;
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
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
                return Err(HttpRequestParseError::UnsupportedTransferEncoding);
            }
            "content-length" => {
                let content_length = u64::from_str(header.value)
                    .map_err(|_| HttpRequestParseError::InvalidContentLength)?;
                if self.has_content_length && self.content_length != content_length {
                    return Err(HttpRequestParseError::InvalidContentLength);
                }
                self.has_content_length = true;
                self.content_length = content_length;
            }
            "host" => {
                if self.host.is_none() {
                    self.host = Some(header.value.to_string());
                }
            }
            _ => {}
        }

        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::<u8>::with_capacity(256);
        let _ = write!(buf, "{} {} {:?}\r\n", self.method, self.uri, self.version);
        if let Some(host) = &self.host {
            if !self.headers.contains_key(header::HOST) {
                let _ = write!(buf, "Host: {host}\r\n");
            }
        }
        for (name, value) in &self.headers {
            buf.extend_from_slice(name.as_str().as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
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
