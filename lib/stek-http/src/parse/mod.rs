/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::HttpLineParseError;

mod header_line;
pub use header_line::HttpHeaderLine;

mod status_line;
pub use status_line::HttpStatusLine;

mod request_line;
pub use request_line::HttpRequestLine;

fn parse_version(buf: &[u8]) -> Result<u8, HttpLineParseError> {
    match buf {
        b"HTTP/1.0" => Ok(0),
        b"HTTP/1.1" => Ok(1),
        b"HTTP/2.0" | b"HTTP/2" => Ok(2),
        _ => Err(HttpLineParseError::InvalidVersion),
    }
}
