/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

#[derive(Default)]
pub struct RustlsCertificatePairBuilder {
    certs: Vec<CertificateDer<'static>>,
    key: Option<PrivateKeyDer<'static>>,
}

impl RustlsCertificatePairBuilder {
    pub fn set_certs(&mut self, certs: Vec<CertificateDer<'static>>) {
        self.certs = certs;
    }

    pub fn set_key(&mut self, key: PrivateKeyDer<'static>) {
        self.key = Some(key);
    }

    pub fn build(self) -> anyhow::Result<RustlsCertificatePair> {
        if self.certs.is_empty() {
            return Err(anyhow!("no certificate set"));
        }
        let Some(key) = self.key else {
            return Err(anyhow!("no private key set"));
        };
        Ok(RustlsCertificatePair {
            certs: self.certs,
            key,
        })
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct RustlsCertificatePair {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl Clone for RustlsCertificatePair {
    fn clone(&self) -> Self {
        RustlsCertificatePair {
            certs: self.certs.clone(),
            key: self.key.clone_key(),
        }
    }
}

impl RustlsCertificatePair {
    /// Load the certificate chain and the private key from PEM files.
    pub fn load_pem_files(cert_file: &Path, key_file: &Path) -> anyhow::Result<Self> {
        let mut builder = RustlsCertificatePairBuilder::default();
        let certs = load_certs(cert_file).context(format!(
            "failed to load certificate from file {}",
            cert_file.display()
        ))?;
        builder.set_certs(certs);
        let key = load_private_key(key_file).context(format!(
            "failed to load private key from file {}",
            key_file.display()
        ))?;
        builder.set_key(key);
        builder.build()
    }

    pub fn certs_owned(&self) -> Vec<CertificateDer<'static>> {
        self.certs.clone()
    }

    pub fn key_owned(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }

    pub fn into_inner(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.certs, self.key)
    }
}

pub fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let iter = CertificateDer::pem_file_iter(path)
        .map_err(|e| anyhow!("unable to open file {}: {e:?}", path.display()))?;
    let mut certs = Vec::new();
    for (i, r) in iter.enumerate() {
        let cert = r.map_err(|e| anyhow!("invalid certificate #{i}: {e:?}"))?;
        certs.push(cert);
    }
    if certs.is_empty() {
        Err(anyhow!(
            "no valid certificate found in file {}",
            path.display()
        ))
    } else {
        Ok(certs)
    }
}

pub fn load_private_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_file(path).map_err(|e| {
        anyhow!(
            "failed to read private key from file {}: {e:?}",
            path.display()
        )
    })
}
