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

// IDs used inside the APK Signing Block, named after the constants in
// Android's apksig library.

pub const APK_SIGNING_BLOCK_MAGIC: &[u8; 16] = b"APK Sig Block 42";

// ID-value pair IDs
pub const SIGNATURE_SCHEME_V2_BLOCK_ID: u32 = 0x7109871A;
pub const SIGNATURE_SCHEME_V3_BLOCK_ID: u32 = 0xF05368C0;
pub const SIGNATURE_SCHEME_V31_BLOCK_ID: u32 = 0x1B93AD61;
pub const VERITY_PADDING_BLOCK_ID: u32 = 0x42726577;
pub const SOURCE_STAMP_V1_BLOCK_ID: u32 = 0x2B09189E;
pub const SOURCE_STAMP_V2_BLOCK_ID: u32 = 0x6DFF800D;
pub const DEPENDENCY_INFO_BLOCK_ID: u32 = 0x504B4453;
pub const PLAY_FROSTING_BLOCK_ID: u32 = 0x2146444E;

// Additional attribute IDs, found in a signer's signed data
pub const STRIPPING_PROTECTION_ATTR_ID: u32 = 0xBEEFF00D;
pub const PROOF_OF_ROTATION_ATTR_ID: u32 = 0x3BA06F8C;
pub const ROTATION_MIN_SDK_VERSION_ATTR_ID: u32 = 0x559F8B02;
pub const ROTATION_ON_DEV_RELEASE_ATTR_ID: u32 = 0xC2A6B3BA;

/// Human readable name of a pair ID, if it's one we know about.
pub fn block_id_name(id: u32) -> Option<&'static str> {
    match id {
        SIGNATURE_SCHEME_V2_BLOCK_ID => Some("APK Signature Scheme v2"),
        SIGNATURE_SCHEME_V3_BLOCK_ID => Some("APK Signature Scheme v3"),
        SIGNATURE_SCHEME_V31_BLOCK_ID => Some("APK Signature Scheme v3.1"),
        VERITY_PADDING_BLOCK_ID => Some("Verity padding"),
        SOURCE_STAMP_V1_BLOCK_ID => Some("Source stamp v1"),
        SOURCE_STAMP_V2_BLOCK_ID => Some("Source stamp v2"),
        DEPENDENCY_INFO_BLOCK_ID => Some("Dependency info"),
        PLAY_FROSTING_BLOCK_ID => Some("Google Play frosting"),
        _ => None
    }
}

/// Signature algorithms as listed in the APK Signature Scheme v2 doc.
///
/// Records always keep the raw `u32`, this is only an interpretation of it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SignatureAlgorithm {
    RsaPssWithSha2_256,
    RsaPssWithSha2_512,
    RsaSsaPkcs1v1_5WithSha2_256,
    RsaSsaPkcs1v1_5WithSha2_512,
    EcdsaWithSha2_256,
    EcdsaWithSha2_512,
    DsaWithSha2_256,
    VerityRsaSsaPkcs1v1_5WithSha2_256,
    VerityEcdsaWithSha2_256,
    VerityDsaWithSha2_256,
    Unknown(u32)
}

impl SignatureAlgorithm {
    pub fn from_id(id: u32) -> SignatureAlgorithm {
        use SignatureAlgorithm::*;
        match id {
            0x0101 => RsaPssWithSha2_256,
            0x0102 => RsaPssWithSha2_512,
            0x0103 => RsaSsaPkcs1v1_5WithSha2_256,
            0x0104 => RsaSsaPkcs1v1_5WithSha2_512,
            0x0201 => EcdsaWithSha2_256,
            0x0202 => EcdsaWithSha2_512,
            0x0301 => DsaWithSha2_256,
            0x0421 => VerityRsaSsaPkcs1v1_5WithSha2_256,
            0x0423 => VerityEcdsaWithSha2_256,
            0x0425 => VerityDsaWithSha2_256,
            other => Unknown(other)
        }
    }

    pub fn id(&self) -> u32 {
        use SignatureAlgorithm::*;
        match self {
            RsaPssWithSha2_256 => 0x0101,
            RsaPssWithSha2_512 => 0x0102,
            RsaSsaPkcs1v1_5WithSha2_256 => 0x0103,
            RsaSsaPkcs1v1_5WithSha2_512 => 0x0104,
            EcdsaWithSha2_256 => 0x0201,
            EcdsaWithSha2_512 => 0x0202,
            DsaWithSha2_256 => 0x0301,
            VerityRsaSsaPkcs1v1_5WithSha2_256 => 0x0421,
            VerityEcdsaWithSha2_256 => 0x0423,
            VerityDsaWithSha2_256 => 0x0425,
            Unknown(id) => *id
        }
    }

    pub fn name(&self) -> &'static str {
        use SignatureAlgorithm::*;
        match self {
            RsaPssWithSha2_256 => "RSASSA-PSS with SHA2-256",
            RsaPssWithSha2_512 => "RSASSA-PSS with SHA2-512",
            RsaSsaPkcs1v1_5WithSha2_256 => "RSASSA-PKCS1-v1_5 with SHA2-256",
            RsaSsaPkcs1v1_5WithSha2_512 => "RSASSA-PKCS1-v1_5 with SHA2-512",
            EcdsaWithSha2_256 => "ECDSA with SHA2-256",
            EcdsaWithSha2_512 => "ECDSA with SHA2-512",
            DsaWithSha2_256 => "DSA with SHA2-256",
            VerityRsaSsaPkcs1v1_5WithSha2_256 => "RSASSA-PKCS1-v1_5 with SHA2-256 (verity)",
            VerityEcdsaWithSha2_256 => "ECDSA with SHA2-256 (verity)",
            VerityDsaWithSha2_256 => "DSA with SHA2-256 (verity)",
            Unknown(_) => "unknown"
        }
    }
}
