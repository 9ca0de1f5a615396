/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read into `buf` until `delimiter` is found or `max_len` bytes have been read.
///
/// Returns whether the delimiter was found, and the number of bytes appended.
/// A return of `(false, n)` with `n < max_len` means EOF.
pub async fn limited_read_until<R>(
    reader: &mut R,
    delimiter: u8,
    max_len: usize,
    buf: &mut Vec<u8>,
) -> io::Result<(bool, usize)>
where
    R: AsyncBufRead + Unpin,
{
    let mut nr: usize = 0;
    while nr < max_len {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok((false, nr));
        }

        let to_search = &available[..available.len().min(max_len - nr)];
        match memchr::memchr(delimiter, to_search) {
            Some(p) => {
                buf.extend_from_slice(&to_search[..=p]);
                reader.consume(p + 1);
                return Ok((true, nr + p + 1));
            }
            None => {
                let len = to_search.len();
                buf.extend_from_slice(to_search);
                reader.consume(len);
                nr += len;
            }
        }
    }
    Ok((false, nr))
}
