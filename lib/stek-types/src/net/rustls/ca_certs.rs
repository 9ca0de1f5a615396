/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::anyhow;
use log::debug;
use rustls::RootCertStore;
use rustls_pki_types::CertificateDer;

use super::load_certs;

/// Load trusted certificates from a PEM file.
pub fn load_ca_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    load_certs(path)
}

pub(super) fn build_root_store(
    certs: &[CertificateDer<'static>],
) -> anyhow::Result<RootCertStore> {
    let mut root_store = RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(certs.iter().cloned());
    debug!("{added} ca certs added, {ignored} ignored");
    if added == 0 {
        return Err(anyhow!("no valid ca certificate found"));
    }
    Ok(root_store)
}
