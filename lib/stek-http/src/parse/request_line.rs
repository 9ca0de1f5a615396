/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::HttpLineParseError;

pub struct HttpRequestLine<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub version: u8,
}

impl<'a> HttpRequestLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpRequestLine<'a>, HttpLineParseError> {
        const MINIMAL_LENGTH: usize = 15; // GET / HTTP/1.x\n

        if buf.len() < MINIMAL_LENGTH {
            return Err(HttpLineParseError::NotLongEnough);
        }

        let line = std::str::from_utf8(buf)?.trim_end();

        let Some((method, left)) = line.split_once(' ') else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        if method.is_empty() || !method.bytes().all(|c| c.is_ascii_uppercase()) {
            return Err(HttpLineParseError::InvalidMethod);
        }

        let Some((uri, version)) = left.rsplit_once(' ') else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(HttpLineParseError::NotLongEnough);
        }
        let version = super::parse_version(version.as_bytes())?;

        Ok(HttpRequestLine {
            method,
            uri,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        let r = HttpRequestLine::parse(b"GET /index.html HTTP/1.1\r\n").unwrap();
        assert_eq!(r.method, "GET");
        assert_eq!(r.uri, "/index.html");
        assert_eq!(r.version, 1);
    }

    #[test]
    fn http_1_0() {
        let r = HttpRequestLine::parse(b"HEAD / HTTP/1.0\n").unwrap();
        assert_eq!(r.method, "HEAD");
        assert_eq!(r.uri, "/");
        assert_eq!(r.version, 0);
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            HttpRequestLine::parse(b"GET / HTTP\r\n"),
            Err(HttpLineParseError::NotLongEnough)
        ));
        assert!(matches!(
            HttpRequestLine::parse(b"get /index HTTP/1.1\r\n"),
            Err(HttpLineParseError::InvalidMethod)
        ));
        assert!(matches!(
            HttpRequestLine::parse(b"GET /index HTTP/1.2\r\n"),
            Err(HttpLineParseError::InvalidVersion)
        ));
    }
}
