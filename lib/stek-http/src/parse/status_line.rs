/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use atoi::FromRadix10Checked;

use super::HttpLineParseError;

pub struct HttpStatusLine<'a> {
    pub version: u8,
    pub code: u16,
    pub reason: &'a str,
}

impl<'a> HttpStatusLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpStatusLine<'a>, HttpLineParseError> {
        const MINIMAL_LENGTH: usize = 13; // HTTP/1.x XYZ\n

        if buf.len() < MINIMAL_LENGTH {
            return Err(HttpLineParseError::NotLongEnough);
        }

        let Some(p) = memchr::memchr(b' ', buf) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let version = super::parse_version(&buf[0..p])?;

        let left = &buf[p + 1..];
        let (code, len) = u16::from_radix_10_checked(left);
        let Some(code) = code else {
            return Err(HttpLineParseError::InvalidStatusCode);
        };
        if len != 3 || !(100..1000).contains(&code) {
            return Err(HttpLineParseError::InvalidStatusCode);
        }

        let reason = match left.get(len..) {
            Some(b"") | None => "",
            Some(s) => std::str::from_utf8(s)?.trim(),
        };

        Ok(HttpStatusLine {
            version,
            code,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        let s = HttpStatusLine::parse(b"HTTP/1.1 200 OK\r\n").unwrap();
        assert_eq!(s.version, 1);
        assert_eq!(s.code, 200);
        assert_eq!(s.reason, "OK");
    }

    #[test]
    fn no_reason() {
        let s = HttpStatusLine::parse(b"HTTP/1.1 204\r\n").unwrap();
        assert_eq!(s.version, 1);
        assert_eq!(s.code, 204);
        assert_eq!(s.reason, "");
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/1\r\n"),
            Err(HttpLineParseError::NotLongEnough)
        ));
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/3.0 200 OK\r\n"),
            Err(HttpLineParseError::InvalidVersion)
        ));
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/1.1 2000 OK\r\n"),
            Err(HttpLineParseError::InvalidStatusCode)
        ));
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/1.1 099 OK\r\n"),
            Err(HttpLineParseError::InvalidStatusCode)
        ));
    }

    #[test]
    fn overflow_status_code() {
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/1.1 99999 OK\r\n"),
            Err(HttpLineParseError::InvalidStatusCode)
        ));
        assert!(matches!(
            HttpStatusLine::parse(b"HTTP/1.1 9999999999 OK\r\n"),
            Err(HttpLineParseError::InvalidStatusCode)
        ));
    }

    #[test]
    fn unregistered_status_code() {
        let s = HttpStatusLine::parse(b"HTTP/1.1 799 Custom\r\n").unwrap();
        assert_eq!(s.code, 799);
    }
}
