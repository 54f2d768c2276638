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

//! Decoding of the APK Signing Block and the signature scheme blocks inside it.
//!
//! Nothing here verifies a signature. The aim is to pull untrusted bytes
//! apart into typed, borrowed views, and to say precisely what is wrong
//! when they don't fit the format.

pub mod byte_cursor;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod ids;
pub mod lineage;
mod pair_decoder;
pub mod scheme_block;
mod signing_block;
mod signing_types;

pub use byte_cursor::ByteCursor;
pub use ids::SignatureAlgorithm;
pub use lineage::{LineageNode, SigningCertificateLineage};
pub use pair_decoder::decode_pairs;
pub use scheme_block::{SchemeDescriptor, SchemeRegistry, SignerLayout};
pub use sigblock_common::{Result, SigBlockError};
pub use signing_block::{BlockFooter, MIN_SIGNING_BLOCK_LEN};
pub use signing_types::*;
