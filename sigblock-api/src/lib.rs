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

//! # sigblock API
//!
//! This crate exposes the main public API for reading the APK Signing Block
//! out of an APK: locating it, validating its framing, and decoding the
//! signers of every signature scheme it carries.
//!
//! ## Inspecting an APK
//!
//! ```no_run
//! use sigblock_api::{inspect_apk, SchemeRegistry};
//!
//! let apk = std::fs::read("app-release.apk")?;
//! if let Some(inspection) = inspect_apk(&apk, &SchemeRegistry::default())? {
//!     for scheme in &inspection.schemes {
//!         println!("{}: {:?} signers", scheme.descriptor.name, scheme.signers.as_ref().map(Vec::len));
//!     }
//! }
//! # Ok::<(), sigblock_api::SigBlockError>(())
//! ```
//!
//! ## Certificates
//!
//! Signers only carry certificate bytes. Decoding them is a separate,
//! optional step, see [summarize_signer].

use log::{debug, warn};

pub use sigblock_cert::{
    summarize_certificate, summarize_public_key, AlgorithmSummary, CertificateDecoder,
    CertificateSummary, PublicKeySummary, RasnCertificateDecoder
};
pub use sigblock_common::{Result, SigBlockError};
pub use sigblock_parse::{
    ids, lineage, AdditionalAttribute, AttributeKind, Digest, Pair, SchemeDescriptor,
    SchemeRegistry, SdkRange, SignatureAlgorithm, SignedData, Signer, SigningBlock,
    SigningCertificateLineage
};
pub use sigblock_zip::{find_offsets, locate_signing_block, SigningBlockRegion, ZipOffsets};

/// Everything decoded from one signing block.
#[derive(Debug, Clone)]
pub struct Inspection<'a> {
    pub block: SigningBlock<'a>,
    /// One entry per registered scheme present in the block, in block order
    pub schemes: Vec<SchemeInspection<'a>>
}

/// The outcome of decoding one scheme's pair. A failure here says nothing
/// about the other schemes in the same block.
#[derive(Debug, Clone)]
pub struct SchemeInspection<'a> {
    pub descriptor: SchemeDescriptor,
    pub signers: Result<Vec<Signer<'a>>>
}

impl<'a> Inspection<'a> {
    pub fn scheme(&self, id: u32) -> Option<&SchemeInspection<'a>> {
        self.schemes.iter().find(|scheme| scheme.descriptor.id == id)
    }

    /// Pairs with an ID that has no known name.
    pub fn unknown_pairs(&self) -> impl Iterator<Item = &Pair<'a>> {
        self.block.pairs.iter().filter(|pair| pair.name().is_none())
    }
}

/// Validates a signing block and decodes every scheme `registry` knows.
///
/// `region` must be exactly the block. If `central_directory_offset` is
/// given, the region is taken to end there and the block's file offset is
/// recorded; pass `None` for a block that was extracted on its own.
///
/// Only framing errors are returned as `Err`. Scheme decoding errors are
/// kept in the matching [SchemeInspection].
pub fn inspect_signing_block<'a>(
    region: &'a [u8],
    central_directory_offset: Option<u64>,
    registry: &SchemeRegistry
) -> Result<Inspection<'a>> {
    let block = match central_directory_offset {
        Some(offset) => SigningBlock::parse_before_central_directory(region, offset)?,
        None => SigningBlock::parse(region)?
    };
    debug!(
        "Signing block of {} bytes with {} pairs",
        block.total_len(),
        block.pairs.len()
    );

    let schemes = block
        .recognized_schemes(registry)
        .into_iter()
        .map(|descriptor| {
            let signers = block.decode_scheme(descriptor);
            if let Err(e) = &signers {
                warn!("Couldn't decode {} signers: {e}", descriptor.name);
            }
            SchemeInspection {
                descriptor: *descriptor,
                signers
            }
        })
        .collect();

    Ok(Inspection { block, schemes })
}

/// Finds the signing block in a whole APK and inspects it.
///
/// `Ok(None)` means the APK has no signing block at all (unsigned, or
/// signed with v1 only).
pub fn inspect_apk<'a>(apk: &'a [u8], registry: &SchemeRegistry) -> Result<Option<Inspection<'a>>> {
    let Some(region) = locate_signing_block(apk)? else {
        debug!("APK has no signing block");
        return Ok(None);
    };
    inspect_signing_block(region.bytes, Some(region.central_directory_offset), registry).map(Some)
}

/// A signer's public key and certificates, decoded. Each one can fail on its
/// own.
#[derive(Debug, Clone)]
pub struct SignerSummary {
    pub public_key: Result<PublicKeySummary>,
    pub certificates: Vec<Result<CertificateSummary>>
}

pub fn summarize_signer(signer: &Signer<'_>, decoder: &dyn CertificateDecoder) -> SignerSummary {
    SignerSummary {
        public_key: summarize_public_key(signer.public_key),
        certificates: signer
            .signed_data
            .certificates
            .iter()
            .map(|der| decoder.decode(der))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use sigblock_parse::{
        fixtures::{encode_scheme_block, encode_signing_block, sample_signer},
        ids::*
    };

    use super::*;

    #[test]
    fn raw_block_without_offset() {
        let block = encode_signing_block(&[(
            SIGNATURE_SCHEME_V2_BLOCK_ID,
            encode_scheme_block(&[sample_signer()])
        )]);
        let inspection = inspect_signing_block(&block, None, &SchemeRegistry::default()).unwrap();

        assert_eq!(inspection.block.offset, None);
        assert_eq!(inspection.schemes.len(), 1);
        let v2 = inspection.scheme(SIGNATURE_SCHEME_V2_BLOCK_ID).unwrap();
        assert_eq!(v2.signers.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn empty_registry_decodes_nothing() {
        let block = encode_signing_block(&[(
            SIGNATURE_SCHEME_V2_BLOCK_ID,
            encode_scheme_block(&[sample_signer()])
        )]);
        let inspection = inspect_signing_block(&block, None, &SchemeRegistry::empty()).unwrap();

        assert!(inspection.schemes.is_empty());
        assert_eq!(inspection.block.pairs.len(), 1);
    }

    #[test]
    fn unknown_pairs_are_listed() {
        let block = encode_signing_block(&[
            (VERITY_PADDING_BLOCK_ID, vec![0; 8]),
            (0x0bad_cafe, b"vendor data".to_vec())
        ]);
        let inspection = inspect_signing_block(&block, None, &SchemeRegistry::default()).unwrap();

        let unknown: Vec<_> = inspection.unknown_pairs().map(|pair| pair.id).collect();
        assert_eq!(unknown, vec![0x0bad_cafe]);
    }

    #[test]
    fn offset_before_the_region_is_a_size_mismatch() {
        let block = encode_signing_block(&[(VERITY_PADDING_BLOCK_ID, vec![0; 8])]);
        let err = inspect_signing_block(&block, Some(3), &SchemeRegistry::default()).unwrap_err();
        assert!(matches!(err, SigBlockError::SizeMismatch { .. }));
    }

    #[test]
    fn placeholder_keys_and_certificates_fail_individually() {
        let block = encode_signing_block(&[(
            SIGNATURE_SCHEME_V2_BLOCK_ID,
            encode_scheme_block(&[sample_signer()])
        )]);
        let signing_block = SigningBlock::parse(&block).unwrap();
        let signers = signing_block.decode_scheme_v2().unwrap();

        let summary = summarize_signer(&signers[0], &RasnCertificateDecoder);
        assert!(matches!(
            summary.public_key,
            Err(SigBlockError::PublicKeyDecodeError(_))
        ));
        assert_eq!(summary.certificates.len(), 2);
        assert!(summary
            .certificates
            .iter()
            .all(|cert| matches!(cert, Err(SigBlockError::CertificateDecodeError(_)))));
    }
}
