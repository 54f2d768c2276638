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

//! The proof-of-rotation attribute of APK Signature Scheme v3, and the other
//! additional attributes that carry a value worth decoding.

use sigblock_common::*;

use crate::{
    byte_cursor::ByteCursor,
    ids::*,
    signing_types::{AdditionalAttribute, SignedData}
};

/// Only version of the lineage format there is.
pub const LINEAGE_VERSION: u32 = 1;

// Capability flags of a lineage node, granted to the next signing key
pub const CAPABILITY_INSTALLED_DATA: u32 = 1;
pub const CAPABILITY_SHARED_USER_ID: u32 = 2;
pub const CAPABILITY_PERMISSION: u32 = 4;
pub const CAPABILITY_ROLLBACK: u32 = 8;
pub const CAPABILITY_AUTH: u32 = 16;

/// The chain of signing certificates an app has rotated through, oldest first.
#[derive(Debug, PartialEq, Clone)]
pub struct SigningCertificateLineage<'a> {
    pub version: u32,
    pub nodes: Vec<LineageNode<'a>>
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LineageNode<'a> {
    // X.509 Certificate (ASN.1 DER form)
    pub certificate: &'a [u8],
    // Algorithm the previous node's key signed this node with
    pub parent_signature_algorithm_id: u32,
    pub flags: u32,
    pub signature_algorithm_id: u32,
    // Made by the previous node's key, empty for the first node
    pub signature: &'a [u8]
}

impl LineageNode<'_> {
    pub fn has_capability(&self, capability: u32) -> bool {
        self.flags & capability == capability
    }
}

/// Decodes the value of a proof-of-rotation attribute.
///
/// ```text
/// version: u32 || node...
/// node := len(len(certificate) || parent_sig_algorithm: u32) || flags: u32 || sig_algorithm: u32 || len(signature)
/// ```
pub fn decode_lineage(value: &[u8]) -> Result<SigningCertificateLineage<'_>> {
    let mut cursor = ByteCursor::new(value);
    let version = cursor.read_u32()?;
    if version != LINEAGE_VERSION {
        return Err(SigBlockError::MalformedPair(format!(
            "unsupported signing certificate lineage version {version}"
        )));
    }

    let mut nodes = vec![];
    while !cursor.is_at_end() {
        let mut node = cursor.read_u32_length_prefixed_cursor()?;
        let mut signed_data = node.read_u32_length_prefixed_cursor()?;
        let certificate = signed_data.read_u32_length_prefixed()?;
        let parent_signature_algorithm_id = signed_data.read_u32()?;
        signed_data.expect_end("lineage node signed data")?;

        nodes.push(LineageNode {
            certificate,
            parent_signature_algorithm_id,
            flags: node.read_u32()?,
            signature_algorithm_id: node.read_u32()?,
            signature: node.read_u32_length_prefixed()?
        });
        node.expect_end("lineage node")?;
    }

    Ok(SigningCertificateLineage { version, nodes })
}

fn decode_u32_attribute(attr: &AdditionalAttribute<'_>) -> Result<u32> {
    let mut cursor = ByteCursor::new(attr.value);
    let value = cursor.read_u32()?;
    cursor.expect_end("u32 attribute")?;
    Ok(value)
}

impl<'a> SignedData<'a> {
    /// The signer's certificate history, if it has rotated keys.
    pub fn proof_of_rotation(&self) -> Option<Result<SigningCertificateLineage<'a>>> {
        self.find_attribute(PROOF_OF_ROTATION_ATTR_ID)
            .map(|attr| decode_lineage(attr.value))
    }

    /// The newest signature scheme the APK was signed with, which protects
    /// against the newer scheme's block being stripped out.
    pub fn stripping_protection(&self) -> Option<Result<u32>> {
        self.find_attribute(STRIPPING_PROTECTION_ATTR_ID)
            .map(decode_u32_attribute)
    }

    /// First SDK version the rotated key applies to (v3.1).
    pub fn rotation_min_sdk(&self) -> Option<Result<u32>> {
        self.find_attribute(ROTATION_MIN_SDK_VERSION_ATTR_ID)
            .map(decode_u32_attribute)
    }

    pub fn rotates_on_dev_release(&self) -> bool {
        self.find_attribute(ROTATION_ON_DEV_RELEASE_ATTR_ID).is_some()
    }
}
