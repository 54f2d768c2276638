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

//! Human-readable summaries of the X.509 certificates and public keys found
//! in signer records.

#[cfg(any(test, feature = "cert-gen"))]
pub mod cert_gen;
mod certificate;
mod names;
mod public_key;

pub use certificate::{summarize_certificate, CertificateDecoder, CertificateSummary, RasnCertificateDecoder};
pub use names::{format_name, oid_string, AlgorithmSummary};
pub use public_key::{summarize_public_key, PublicKeySummary};
