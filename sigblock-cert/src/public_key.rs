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

use rasn_pkix::SubjectPublicKeyInfo;
use rsa::{pkcs8::DecodePublicKey, traits::PublicKeyParts, RsaPublicKey};
use sha2::{Digest, Sha256};
use sigblock_common::*;

use crate::certificate::colon_hex;
use crate::names::AlgorithmSummary;

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// What a signer's SubjectPublicKeyInfo says about its key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKeySummary {
    pub algorithm: AlgorithmSummary,
    /// Only known for RSA keys
    pub rsa_modulus_bits: Option<usize>,
    pub sha256_fingerprint: [u8; 32],
    pub der: Vec<u8>
}

impl PublicKeySummary {
    pub fn sha256_fingerprint_hex(&self) -> String {
        colon_hex(&self.sha256_fingerprint)
    }
}

/// Reads DER-encoded SubjectPublicKeyInfo, the form both signer records and
/// certificates carry keys in.
pub fn summarize_public_key(der: &[u8]) -> Result<PublicKeySummary> {
    let info = rasn::der::decode::<SubjectPublicKeyInfo>(der)
        .map_err(|e| SigBlockError::PublicKeyDecodeError(e.to_string()))?;
    let algorithm = AlgorithmSummary::from_identifier(&info.algorithm);

    let rsa_modulus_bits = if algorithm.oid == OID_RSA_ENCRYPTION {
        let key = RsaPublicKey::from_public_key_der(der)?;
        Some(key.size() * 8)
    } else {
        None
    };

    Ok(PublicKeySummary {
        algorithm,
        rsa_modulus_bits,
        sha256_fingerprint: Sha256::digest(der).into(),
        der: der.to_vec()
    })
}
