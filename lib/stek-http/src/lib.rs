/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod parse;
pub use parse::{HttpHeaderLine, HttpLineParseError, HttpRequestLine, HttpStatusLine};

mod read;
pub use read::limited_read_until;

mod body;
pub use body::{HttpBodyReadError, HttpBodyType, read_body};

mod request;
pub use request::{HttpRequestHead, HttpRequestParseError};

mod response;
pub use response::{HttpResponseHead, HttpResponseParseError};

const CRLF: &[u8] = b"\r\n";

fn is_header_end_line(line: &[u8]) -> bool {
    line == b"\n" || line == CRLF
}
