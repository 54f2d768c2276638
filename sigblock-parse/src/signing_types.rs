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

// Decoded views of the APK Signing Block, named according to the APK
// Signature Scheme v2 doc. Everything borrows from the caller's buffer.

use crate::ids::*;

/// A validated APK Signing Block.
#[derive(Debug, PartialEq, Clone)]
pub struct SigningBlock<'a> {
    // Size of the block MINUS the leading size field.
    // This field appears twice, the 'minus' is only for one of them.
    // So if the block is 128 bytes, this reads 120.
    pub size_of_block: u64,
    // Absolute file offset of the block's first byte, if the block was
    // parsed relative to a central directory.
    pub offset: Option<u64>,
    pub pairs: Vec<Pair<'a>>
}

/// One ID-value pair of the signing block. Unknown IDs are kept as-is.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Pair<'a> {
    pub id: u32,
    pub value: &'a [u8],
    // Offset of the pair's length prefix from the start of the block
    pub offset: usize
}

impl Pair<'_> {
    pub fn name(&self) -> Option<&'static str> {
        block_id_name(self.id)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SdkRange {
    pub min_sdk: u32,
    pub max_sdk: u32
}

impl SdkRange {
    pub fn contains(&self, sdk: u32) -> bool {
        (self.min_sdk..=self.max_sdk).contains(&sdk)
    }
}

/// One signer of a signature scheme block.
#[derive(Debug, PartialEq, Clone)]
pub struct Signer<'a> {
    pub signed_data: SignedData<'a>,
    // The exact bytes the signatures are computed over, without their length prefix
    pub signed_data_bytes: &'a [u8],
    // Only present for v3 and later
    pub sdk_range: Option<SdkRange>,
    pub signatures: Vec<Signature<'a>>,
    // SubjectPublicKeyInfo, ASN.1 DER form
    pub public_key: &'a [u8]
}

impl<'a> Signer<'a> {
    /// The certificate the signer signed with, if any were listed.
    pub fn first_certificate(&self) -> Option<&'a [u8]> {
        self.signed_data.certificates.first().copied()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SignedData<'a> {
    pub digests: Vec<Digest<'a>>,
    // Array of X.509 Certificates (ASN.1 DER form) as bytes. The first one is the signer's.
    pub certificates: Vec<&'a [u8]>,
    // Only present for v3 and later
    pub sdk_range: Option<SdkRange>,
    pub additional_attributes: Vec<AdditionalAttribute<'a>>
}

impl<'a> SignedData<'a> {
    pub fn find_digest(&self, signature_algorithm_id: u32) -> Option<&Digest<'a>> {
        self.digests
            .iter()
            .find(|digest| digest.signature_algorithm_id == signature_algorithm_id)
    }

    /// First attribute with the given ID.
    pub fn find_attribute(&self, id: u32) -> Option<&AdditionalAttribute<'a>> {
        self.additional_attributes.iter().find(|attr| attr.id == id)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Signature<'a> {
    pub signature_algorithm_id: u32,
    pub signature: &'a [u8]
}

impl Signature<'_> {
    pub fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::from_id(self.signature_algorithm_id)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Digest<'a> {
    pub signature_algorithm_id: u32,
    pub digest: &'a [u8]
}

impl Digest<'_> {
    pub fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::from_id(self.signature_algorithm_id)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AdditionalAttribute<'a> {
    pub id: u32,
    pub value: &'a [u8]
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AttributeKind {
    StrippingProtection,
    ProofOfRotation,
    RotationMinSdkVersion,
    RotationOnDevRelease,
    Unknown
}

impl AdditionalAttribute<'_> {
    pub fn kind(&self) -> AttributeKind {
        match self.id {
            STRIPPING_PROTECTION_ATTR_ID => AttributeKind::StrippingProtection,
            PROOF_OF_ROTATION_ATTR_ID => AttributeKind::ProofOfRotation,
            ROTATION_MIN_SDK_VERSION_ATTR_ID => AttributeKind::RotationMinSdkVersion,
            ROTATION_ON_DEV_RELEASE_ATTR_ID => AttributeKind::RotationOnDevRelease,
            _ => AttributeKind::Unknown
        }
    }
}
