// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use md5::Md5;
use pem::Pem;
use rasn::types::IntegerType;
use rasn_pkix::{Certificate, Time};
use sha2::{Digest, Sha256};
use sigblock_common::*;

use crate::names::{format_name, AlgorithmSummary};
use crate::public_key::{summarize_public_key, PublicKeySummary};

/// Turns the DER bytes of an X.509 certificate into something printable.
///
/// The parser hands out certificates as raw bytes and never calls a decoder
/// itself, so callers choose if and when certificates get decoded.
pub trait CertificateDecoder {
    fn decode(&self, der: &[u8]) -> Result<CertificateSummary>;
}

/// [CertificateDecoder] backed by `rasn`'s DER decoder and the `rasn-pkix`
/// certificate schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasnCertificateDecoder;

impl CertificateDecoder for RasnCertificateDecoder {
    fn decode(&self, der: &[u8]) -> Result<CertificateSummary> {
        summarize_certificate(der)
    }
}

/// The parts of a certificate worth showing a person.
#[derive(Debug, Clone)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    /// Big-endian two's complement, as encoded
    pub serial_number: Vec<u8>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub signature_algorithm: AlgorithmSummary,
    pub public_key: PublicKeySummary,
    pub sha256_fingerprint: [u8; 32],
    /// Older tooling identifies signing certificates by this digest
    pub md5_fingerprint: [u8; 16],
    /// The certificate exactly as it appeared in the signing block
    pub der: Vec<u8>
}

impl CertificateSummary {
    /// Subject and issuer are the same name. Says nothing about whether the
    /// signature checks out.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    pub fn serial_number_hex(&self) -> String {
        hex::encode(&self.serial_number)
    }

    /// `AB:CD:...`, the way `keytool` and `apksigner` print fingerprints.
    pub fn sha256_fingerprint_hex(&self) -> String {
        colon_hex(&self.sha256_fingerprint)
    }

    /// Plain lower-case hex, the way `certMd5` style identifiers are written.
    pub fn md5_fingerprint_hex(&self) -> String {
        hex::encode(self.md5_fingerprint)
    }

    pub fn to_pem(&self) -> String {
        pem::encode(&Pem::new("CERTIFICATE", self.der.clone()))
    }
}

/// Decodes a DER certificate with [RasnCertificateDecoder].
pub fn summarize_certificate(der: &[u8]) -> Result<CertificateSummary> {
    let certificate = rasn::der::decode::<Certificate>(der)?;
    let tbs = &certificate.tbs_certificate;

    let (serial_bytes, serial_len) = tbs.serial_number.to_signed_bytes_be();
    let public_key_der = rasn::der::encode(&tbs.subject_public_key_info)?;
    let summary = CertificateSummary {
        subject: format_name(&tbs.subject),
        issuer: format_name(&tbs.issuer),
        serial_number: serial_bytes.as_ref()[..serial_len].to_vec(),
        not_before: to_utc(&tbs.validity.not_before),
        not_after: to_utc(&tbs.validity.not_after),
        signature_algorithm: AlgorithmSummary::from_identifier(&certificate.signature_algorithm),
        public_key: summarize_public_key(&public_key_der)?,
        sha256_fingerprint: Sha256::digest(der).into(),
        md5_fingerprint: Md5::digest(der).into(),
        der: der.to_vec()
    };
    log::debug!("Decoded certificate for {}", summary.subject);
    Ok(summary)
}

fn to_utc(time: &Time) -> DateTime<Utc> {
    match time {
        Time::Utc(time) => *time,
        Time::General(time) => time.with_timezone(&Utc)
    }
}

pub(crate) fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
