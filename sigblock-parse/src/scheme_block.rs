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

// Decoding of the APK Signature Scheme v2, v3 and v3.1 blocks.
// APK Signature Scheme v2 based on https://source.android.com/docs/security/features/apksigning/v2
// APK Signature Scheme v3 based on https://source.android.com/docs/security/features/apksigning/v3

use log::{debug, warn};
use sigblock_common::*;

use crate::{
    byte_cursor::{read_length_prefixed_sequence, ByteCursor},
    ids::*,
    signing_types::*
};

/// How a scheme lays out its signers. v3 adds an SDK range both to the
/// signer and to its signed data, everything else is shared with v2.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SignerLayout {
    V2,
    V3
}

/// Ties a pair ID to the layout its value is decoded with.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SchemeDescriptor {
    pub id: u32,
    pub name: &'static str,
    pub layout: SignerLayout
}

pub const SCHEME_V2: SchemeDescriptor = SchemeDescriptor {
    id: SIGNATURE_SCHEME_V2_BLOCK_ID,
    name: "v2",
    layout: SignerLayout::V2
};

pub const SCHEME_V3: SchemeDescriptor = SchemeDescriptor {
    id: SIGNATURE_SCHEME_V3_BLOCK_ID,
    name: "v3",
    layout: SignerLayout::V3
};

// v3.1 is v3 with a different ID, so that older platforms ignore it
pub const SCHEME_V31: SchemeDescriptor = SchemeDescriptor {
    id: SIGNATURE_SCHEME_V31_BLOCK_ID,
    name: "v3.1",
    layout: SignerLayout::V3
};

/// The set of pair IDs that get decoded as signature schemes.
///
/// The default knows v2, v3 and v3.1. Anything else can be added without
/// touching the decoders, as long as it uses one of the known layouts.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SchemeRegistry {
    schemes: Vec<SchemeDescriptor>
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        SchemeRegistry {
            schemes: vec![SCHEME_V2, SCHEME_V3, SCHEME_V31]
        }
    }
}

impl SchemeRegistry {
    pub fn empty() -> SchemeRegistry {
        SchemeRegistry { schemes: vec![] }
    }

    /// Adds a scheme, replacing any scheme already registered with the same ID.
    pub fn with_scheme(mut self, scheme: SchemeDescriptor) -> SchemeRegistry {
        self.schemes.retain(|known| known.id != scheme.id);
        self.schemes.push(scheme);
        self
    }

    pub fn get(&self, id: u32) -> Option<&SchemeDescriptor> {
        self.schemes.iter().find(|scheme| scheme.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemeDescriptor> {
        self.schemes.iter()
    }
}

/// Decodes the value of a signature scheme pair into its signers.
///
/// Only structure is checked. No signers, or a signer without certificates
/// or signatures, decodes fine and it's up to the caller to decide whether
/// that's acceptable.
pub fn decode_scheme_block(value: &[u8], layout: SignerLayout) -> Result<Vec<Signer<'_>>> {
    let mut cursor = ByteCursor::new(value);
    let signers = read_length_prefixed_sequence(&mut cursor, "signer", |signer| {
        decode_signer(signer, layout)
    })?;
    cursor.expect_end("signature scheme block")?;
    Ok(signers)
}

fn decode_signer<'a>(cursor: &mut ByteCursor<'a>, layout: SignerLayout) -> Result<Signer<'a>> {
    let signed_data_bytes = cursor.read_u32_length_prefixed()?;
    let signed_data = decode_signed_data(signed_data_bytes, layout)?;
    let sdk_range = match layout {
        SignerLayout::V2 => None,
        SignerLayout::V3 => Some(read_sdk_range(cursor)?)
    };
    let signatures = read_length_prefixed_sequence(cursor, "signature", |signature| {
        Ok(Signature {
            signature_algorithm_id: signature.read_u32()?,
            signature: signature.read_u32_length_prefixed()?
        })
    })?;
    let public_key = cursor.read_u32_length_prefixed()?;

    Ok(Signer {
        signed_data,
        signed_data_bytes,
        sdk_range,
        signatures,
        public_key
    })
}

/// Decodes the bytes the signer's signatures are computed over.
pub fn decode_signed_data(bytes: &[u8], layout: SignerLayout) -> Result<SignedData<'_>> {
    let mut cursor = ByteCursor::new(bytes);
    let digests = read_length_prefixed_sequence(&mut cursor, "digest", |digest| {
        Ok(Digest {
            signature_algorithm_id: digest.read_u32()?,
            digest: digest.read_u32_length_prefixed()?
        })
    })?;
    let certificates =
        read_length_prefixed_sequence(&mut cursor, "certificate", |cert| Ok(cert.read_rest()))?;
    let sdk_range = match layout {
        SignerLayout::V2 => None,
        SignerLayout::V3 => Some(read_sdk_range(&mut cursor)?)
    };
    let additional_attributes =
        read_length_prefixed_sequence(&mut cursor, "additional attribute", |attr| {
            if attr.remaining() < 4 {
                return Err(SigBlockError::MalformedPair(format!(
                    "additional attribute of {} bytes is too short for its ID",
                    attr.remaining()
                )));
            }
            Ok(AdditionalAttribute {
                id: attr.read_u32()?,
                value: attr.read_rest()
            })
        })?;
    cursor.expect_end("signed data")?;

    Ok(SignedData {
        digests,
        certificates,
        sdk_range,
        additional_attributes
    })
}

fn read_sdk_range(cursor: &mut ByteCursor<'_>) -> Result<SdkRange> {
    Ok(SdkRange {
        min_sdk: cursor.read_u32()?,
        max_sdk: cursor.read_u32()?
    })
}

impl<'a> SigningBlock<'a> {
    /// Decodes the signers of one scheme. A block without that scheme's pair
    /// has no signers for it, so that's an empty list rather than an error.
    pub fn decode_scheme(&self, scheme: &SchemeDescriptor) -> Result<Vec<Signer<'a>>> {
        let Some(pair) = self.find_pair(scheme.id) else {
            debug!("no {} pair in signing block", scheme.name);
            return Ok(vec![]);
        };
        if self.pairs_with_id(scheme.id).count() > 1 {
            warn!(
                "signing block has more than one {} pair, decoding the first",
                scheme.name
            );
        }
        decode_scheme_block(pair.value, scheme.layout)
    }

    pub fn decode_scheme_v2(&self) -> Result<Vec<Signer<'a>>> {
        self.decode_scheme(&SCHEME_V2)
    }

    pub fn decode_scheme_v3(&self) -> Result<Vec<Signer<'a>>> {
        self.decode_scheme(&SCHEME_V3)
    }

    pub fn decode_scheme_v31(&self) -> Result<Vec<Signer<'a>>> {
        self.decode_scheme(&SCHEME_V31)
    }

    /// The schemes of `registry` that have a pair in this block, in block order.
    pub fn recognized_schemes<'r>(
        &self,
        registry: &'r SchemeRegistry
    ) -> Vec<&'r SchemeDescriptor> {
        let mut found: Vec<&SchemeDescriptor> = vec![];
        for pair in &self.pairs {
            match registry.get(pair.id) {
                Some(scheme) if !found.contains(&scheme) => found.push(scheme),
                Some(_) => {}
                None => debug!("pair {:#010x} is not a signature scheme", pair.id)
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::fixtures::*;

    fn v3_signer() -> SignerFixture {
        SignerFixture {
            sdk_range: Some((28, 0x7FFFFFFF)),
            attributes: vec![(ROTATION_MIN_SDK_VERSION_ATTR_ID, 33u32.to_le_bytes().to_vec())],
            ..sample_signer()
        }
    }

    #[test]
    fn decodes_v2_signer_with_two_certificates() {
        let fixture = sample_signer();
        let value = encode_scheme_block(&[fixture.clone()]);
        let signers = decode_scheme_block(&value, SignerLayout::V2).unwrap();

        assert_eq!(signers.len(), 1);
        let signer = &signers[0];
        assert_eq!(
            signer.signed_data.certificates,
            vec![b"first certificate".as_slice(), b"second certificate".as_slice()]
        );
        assert_eq!(signer.first_certificate(), Some(b"first certificate".as_slice()));
        assert_eq!(signer.signatures.len(), 1);
        assert_eq!(signer.signatures[0].signature_algorithm_id, 0x0103);
        assert_eq!(
            signer.signatures[0].algorithm(),
            SignatureAlgorithm::RsaSsaPkcs1v1_5WithSha2_256
        );
        assert_eq!(signer.signatures[0].signature, &[0x5e; 256][..]);
        assert_eq!(signer.public_key, b"public key");
        assert_eq!(signer.sdk_range, None);
        assert_eq!(signer.signed_data_bytes, &fixture.signed_data()[..]);
        assert_eq!(signer.signed_data.find_digest(0x0103).unwrap().digest, &[0xd1; 32][..]);
        assert!(signer.signed_data.additional_attributes.is_empty());
    }

    #[test]
    fn decodes_v3_sdk_ranges_and_attributes() {
        let value = encode_scheme_block(&[v3_signer()]);
        let signers = decode_scheme_block(&value, SignerLayout::V3).unwrap();
        let signer = &signers[0];
        let range = SdkRange {
            min_sdk: 28,
            max_sdk: 0x7FFFFFFF
        };
        assert_eq!(signer.sdk_range, Some(range));
        assert_eq!(signer.signed_data.sdk_range, Some(range));
        assert!(range.contains(33));
        assert!(!range.contains(27));
        let attr = signer.signed_data.additional_attributes[0];
        assert_eq!(attr.kind(), AttributeKind::RotationMinSdkVersion);
        assert_eq!(attr.value, 33u32.to_le_bytes());
    }

    #[test]
    fn v3_block_read_as_v2_is_malformed() {
        let value = encode_scheme_block(&[v3_signer()]);
        assert!(decode_scheme_block(&value, SignerLayout::V2).is_err());
    }

    #[test]
    fn unknown_algorithms_are_preserved() {
        let fixture = SignerFixture {
            digests: vec![(0x9999, vec![1]), (0x0201, vec![2])],
            signatures: vec![(0x9999, vec![3]), (0x0201, vec![4])],
            ..sample_signer()
        };
        let value = encode_scheme_block(&[fixture]);
        let signer = &decode_scheme_block(&value, SignerLayout::V2).unwrap()[0];
        let ids: Vec<_> = signer.signatures.iter().map(|s| s.signature_algorithm_id).collect();
        assert_eq!(ids, vec![0x9999, 0x0201]);
        assert_eq!(signer.signatures[0].algorithm(), SignatureAlgorithm::Unknown(0x9999));
        assert_eq!(signer.signed_data.digests[0].digest, &[1]);
        assert_eq!(signer.signed_data.digests[1].algorithm(), SignatureAlgorithm::EcdsaWithSha2_256);
    }

    #[test]
    fn empty_signers_are_structurally_fine() {
        let fixture = SignerFixture::default();
        let value = encode_scheme_block(&[fixture.clone(), fixture]);
        let signers = decode_scheme_block(&value, SignerLayout::V2).unwrap();
        assert_eq!(signers.len(), 2);
        assert!(signers[0].signatures.is_empty());
        assert!(signers[0].signed_data.certificates.is_empty());

        let no_signers = len_pfx_sequence::<Vec<u8>>(&[]);
        assert!(decode_scheme_block(&no_signers, SignerLayout::V2)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn trailing_bytes_after_signers_are_malformed() {
        let mut value = encode_scheme_block(&[sample_signer()]);
        value.push(0);
        assert!(matches!(
            decode_scheme_block(&value, SignerLayout::V2),
            Err(SigBlockError::MalformedPair(_))
        ));
    }

    #[test]
    fn signer_with_unused_bytes_is_malformed() {
        let mut signer = sample_signer().encode();
        signer.extend([0; 3]);
        let value = len_pfx_sequence(&[signer]);
        assert!(matches!(
            decode_scheme_block(&value, SignerLayout::V2),
            Err(SigBlockError::MalformedPair(_))
        ));
    }

    #[test]
    fn signed_data_with_unused_bytes_is_malformed() {
        let mut signed_data = sample_signer().signed_data();
        signed_data.push(0xff);
        assert!(matches!(
            decode_signed_data(&signed_data, SignerLayout::V2),
            Err(SigBlockError::MalformedPair(_))
        ));
    }

    #[test]
    fn short_attribute_is_malformed() {
        let mut signed_data = len_pfx_sequence::<Vec<u8>>(&[]);
        signed_data.extend(len_pfx_sequence::<Vec<u8>>(&[]));
        signed_data.extend(len_pfx_sequence(&[vec![1u8, 2]]));
        assert!(matches!(
            decode_signed_data(&signed_data, SignerLayout::V2),
            Err(SigBlockError::MalformedPair(_))
        ));
    }

    #[rstest(cut, case(1), case(4), case(37), case(200))]
    fn truncated_scheme_blocks_fail(cut: usize) {
        let value = encode_scheme_block(&[sample_signer()]);
        let result = decode_scheme_block(&value[..value.len() - cut], SignerLayout::V2);
        assert!(matches!(result, Err(SigBlockError::TruncatedData { .. })));
    }

    #[test]
    fn every_prefix_of_a_signer_fails() {
        let value = encode_scheme_block(&[v3_signer()]);
        for len in 0..value.len() {
            assert!(decode_scheme_block(&value[..len], SignerLayout::V3).is_err());
        }
    }

    #[test]
    fn registry_can_be_extended() {
        let custom = SchemeDescriptor {
            id: 0x12345678,
            name: "custom",
            layout: SignerLayout::V3
        };
        let registry = SchemeRegistry::default().with_scheme(custom);
        assert_eq!(registry.get(0x12345678), Some(&custom));
        assert_eq!(registry.iter().count(), 4);
        assert_eq!(SchemeRegistry::empty().get(SIGNATURE_SCHEME_V2_BLOCK_ID), None);

        let value = encode_scheme_block(&[v3_signer()]);
        let bytes = encode_signing_block(&[(0x12345678, value)]);
        let block = SigningBlock::parse(&bytes).unwrap();
        assert_eq!(block.recognized_schemes(&registry), vec![&custom]);
        assert_eq!(block.decode_scheme(&custom).unwrap().len(), 1);
        assert!(block.recognized_schemes(&SchemeRegistry::default()).is_empty());
    }

    #[test]
    fn v2_block_with_one_self_signed_certificate() {
        let fixture = SignerFixture {
            certificates: vec![b"self-signed".to_vec()],
            ..sample_signer()
        };
        let bytes = encode_signing_block(&[(0x7109871a, encode_scheme_block(&[fixture]))]);
        let block = SigningBlock::parse(&bytes).unwrap();

        assert_eq!(block.find_pair(0x7109871a).unwrap().id, 0x7109871a);
        let signers = block.decode_scheme_v2().unwrap();
        assert_eq!(signers.len(), 1);
        assert_eq!(signers[0].signed_data.certificates.len(), 1);
        assert!(block.decode_scheme_v3().unwrap().is_empty());
        assert!(block.decode_scheme_v31().unwrap().is_empty());
    }

    #[test]
    fn broken_scheme_does_not_hide_the_pairs() {
        let mut broken_v3 = encode_scheme_block(&[v3_signer()]);
        broken_v3.truncate(broken_v3.len() - 5);
        let bytes = encode_signing_block(&[
            (SIGNATURE_SCHEME_V2_BLOCK_ID, encode_scheme_block(&[sample_signer()])),
            (SIGNATURE_SCHEME_V3_BLOCK_ID, broken_v3)
        ]);
        let block = SigningBlock::parse(&bytes).unwrap();
        assert!(block.find_pair(SIGNATURE_SCHEME_V3_BLOCK_ID).is_some());
        assert!(block.decode_scheme_v3().is_err());
        assert_eq!(block.decode_scheme_v2().unwrap().len(), 1);
        assert_eq!(
            block.recognized_schemes(&SchemeRegistry::default()),
            vec![&SCHEME_V2, &SCHEME_V3]
        );
    }
}
