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

//! Throwaway certificates for tests. Never sign anything real with these.

use rcgen::{date_time_ymd, CertificateParams, DistinguishedName, DnType, KeyPair};
use sigblock_common::*;

/// A self-signed certificate and the SubjectPublicKeyInfo of its key, both DER.
pub struct TestingCertificate {
    pub certificate: Vec<u8>,
    pub public_key: Vec<u8>
}

/// Self-signs an ECDSA P-256 certificate valid from 2024 through 2049 for
/// `CN=<common_name>, O=Example, Inc.`.
pub fn generate_testing_certificate(common_name: &str) -> Result<TestingCertificate> {
    let generation_failed =
        |e: rcgen::Error| SigBlockError::CertificateDecodeError(format!("certificate generation failed: {e}"));

    let key_pair = KeyPair::generate().map_err(generation_failed)?;
    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, common_name);
    distinguished_name.push(DnType::OrganizationName, "Example, Inc.");

    let mut params = CertificateParams::new(vec![]).map_err(generation_failed)?;
    params.distinguished_name = distinguished_name;
    params.not_before = date_time_ymd(2024, 1, 1);
    params.not_after = date_time_ymd(2049, 12, 31);
    let certificate = params.self_signed(&key_pair).map_err(generation_failed)?;

    Ok(TestingCertificate {
        certificate: certificate.der().to_vec(),
        public_key: key_pair.public_key_der()
    })
}
