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

use rstest::rstest;
use sigblock_api::{
    find_offsets, ids::*, inspect_apk, lineage::*, summarize_certificate, summarize_signer,
    RasnCertificateDecoder, SchemeRegistry, SdkRange, SigBlockError
};
use sigblock_cert::cert_gen::{generate_testing_certificate, TestingCertificate};
use sigblock_parse::fixtures::{
    encode_lineage, encode_scheme_block, encode_signing_block, LineageNodeFixture, SignerFixture
};
use sigblock_zip::fixtures::{insert_signing_block, write_archive};

const ECDSA_SHA256: u32 = 0x0201;

fn unsigned_apk() -> Vec<u8> {
    write_archive(&[
        ("AndroidManifest.xml", b"<manifest package=\"com.example\"/>".as_slice()),
        ("classes.dex", b"dex\n035\0".as_slice()),
        ("resources.arsc", [0u8; 64].as_slice())
    ])
    .unwrap()
}

fn signer(cert: &TestingCertificate, sdk_range: Option<(u32, u32)>) -> SignerFixture {
    SignerFixture {
        digests: vec![(ECDSA_SHA256, vec![0xd1; 32])],
        certificates: vec![cert.certificate.clone()],
        attributes: vec![],
        signatures: vec![(ECDSA_SHA256, vec![0x5e; 72])],
        public_key: cert.public_key.clone(),
        sdk_range
    }
}

fn sign(apk: &[u8], pairs: &[(u32, Vec<u8>)]) -> Vec<u8> {
    insert_signing_block(apk, &encode_signing_block(pairs)).unwrap()
}

#[test]
fn inspects_a_v2_v3_signed_apk() {
    let cert = generate_testing_certificate("sigblock test signer").unwrap();
    let apk = unsigned_apk();
    let block_start = find_offsets(&apk).unwrap().cd_start as u64;
    let signed = sign(
        &apk,
        &[
            (SIGNATURE_SCHEME_V2_BLOCK_ID, encode_scheme_block(&[signer(&cert, None)])),
            (
                SIGNATURE_SCHEME_V3_BLOCK_ID,
                encode_scheme_block(&[signer(&cert, Some((28, 0x7fff_ffff)))])
            ),
            (VERITY_PADDING_BLOCK_ID, vec![0; 1024])
        ]
    );

    let inspection = inspect_apk(&signed, &SchemeRegistry::default())
        .unwrap()
        .unwrap();
    assert_eq!(inspection.block.offset, Some(block_start));
    assert_eq!(inspection.block.pairs.len(), 3);
    let names: Vec<_> = inspection.schemes.iter().map(|s| s.descriptor.name).collect();
    assert_eq!(names, vec!["v2", "v3"]);

    let v2 = inspection.scheme(SIGNATURE_SCHEME_V2_BLOCK_ID).unwrap();
    let v2_signers = v2.signers.as_ref().unwrap();
    assert_eq!(v2_signers.len(), 1);
    assert_eq!(v2_signers[0].sdk_range, None);
    assert_eq!(v2_signers[0].first_certificate(), Some(cert.certificate.as_slice()));

    let v3 = inspection.scheme(SIGNATURE_SCHEME_V3_BLOCK_ID).unwrap();
    let v3_signer = &v3.signers.as_ref().unwrap()[0];
    let range = SdkRange {
        min_sdk: 28,
        max_sdk: 0x7fff_ffff
    };
    assert_eq!(v3_signer.sdk_range, Some(range));
    assert_eq!(v3_signer.signed_data.sdk_range, Some(range));
    assert_eq!(
        v3_signer.signatures[0].algorithm().name(),
        "ECDSA with SHA2-256"
    );

    let summary = summarize_signer(v3_signer, &RasnCertificateDecoder);
    let public_key = summary.public_key.unwrap();
    assert_eq!(public_key.algorithm.name, Some("EC"));
    let certificate = summary.certificates[0].as_ref().unwrap();
    assert!(certificate.subject.contains("CN=sigblock test signer"));
    assert!(certificate.is_self_issued());
    assert_eq!(certificate.public_key, public_key);
}

#[test]
fn broken_v3_leaves_v2_and_the_inventory_intact() {
    let cert = generate_testing_certificate("v2 survives").unwrap();
    let mut v3 = encode_scheme_block(&[signer(&cert, Some((24, 33)))]);
    v3.truncate(v3.len() - 5);
    let signed = sign(
        &unsigned_apk(),
        &[
            (SIGNATURE_SCHEME_V2_BLOCK_ID, encode_scheme_block(&[signer(&cert, None)])),
            (SIGNATURE_SCHEME_V3_BLOCK_ID, v3)
        ]
    );

    let inspection = inspect_apk(&signed, &SchemeRegistry::default())
        .unwrap()
        .unwrap();
    assert_eq!(inspection.block.pairs.len(), 2);
    assert!(inspection.scheme(SIGNATURE_SCHEME_V2_BLOCK_ID).unwrap().signers.is_ok());
    assert!(matches!(
        inspection.scheme(SIGNATURE_SCHEME_V3_BLOCK_ID).unwrap().signers,
        Err(SigBlockError::TruncatedData { .. })
    ));
}

#[test]
fn unsigned_apk_has_nothing_to_inspect() {
    assert!(inspect_apk(&unsigned_apk(), &SchemeRegistry::default())
        .unwrap()
        .is_none());
}

#[rstest]
#[case::one_more(1)]
#[case::one_less(u64::MAX)]
fn disagreeing_size_fields_fail_the_whole_block(#[case] delta: u64) {
    let apk = unsigned_apk();
    let block_start = find_offsets(&apk).unwrap().cd_start;
    let mut signed = sign(&apk, &[(VERITY_PADDING_BLOCK_ID, vec![0; 32])]);

    let header = block_start..block_start + 8;
    let size = u64::from_le_bytes(signed[header.clone()].try_into().unwrap()).wrapping_add(delta);
    signed[header].copy_from_slice(&size.to_le_bytes());

    assert!(matches!(
        inspect_apk(&signed, &SchemeRegistry::default()),
        Err(SigBlockError::SizeMismatch { .. })
    ));
}

#[test]
fn rotated_signer_carries_its_lineage() {
    let old = generate_testing_certificate("old signer").unwrap();
    let new = generate_testing_certificate("new signer").unwrap();
    let lineage = encode_lineage(
        LINEAGE_VERSION,
        &[
            LineageNodeFixture {
                certificate: old.certificate.clone(),
                parent_signature_algorithm_id: 0,
                flags: CAPABILITY_INSTALLED_DATA | CAPABILITY_SHARED_USER_ID,
                signature_algorithm_id: ECDSA_SHA256,
                signature: vec![]
            },
            LineageNodeFixture {
                certificate: new.certificate.clone(),
                parent_signature_algorithm_id: ECDSA_SHA256,
                flags: CAPABILITY_INSTALLED_DATA,
                signature_algorithm_id: ECDSA_SHA256,
                signature: vec![0x42; 72]
            }
        ]
    );
    let mut rotated = signer(&new, Some((33, 0x7fff_ffff)));
    rotated.attributes = vec![
        (PROOF_OF_ROTATION_ATTR_ID, lineage),
        (ROTATION_MIN_SDK_VERSION_ATTR_ID, 33u32.to_le_bytes().to_vec())
    ];
    let signed = sign(
        &unsigned_apk(),
        &[(SIGNATURE_SCHEME_V31_BLOCK_ID, encode_scheme_block(&[rotated]))]
    );

    let inspection = inspect_apk(&signed, &SchemeRegistry::default())
        .unwrap()
        .unwrap();
    let v31 = inspection.scheme(SIGNATURE_SCHEME_V31_BLOCK_ID).unwrap();
    let signed_data = &v31.signers.as_ref().unwrap()[0].signed_data;
    assert_eq!(signed_data.rotation_min_sdk().unwrap().unwrap(), 33);

    let lineage = signed_data.proof_of_rotation().unwrap().unwrap();
    assert_eq!(lineage.nodes.len(), 2);
    assert!(lineage.nodes[0].has_capability(CAPABILITY_SHARED_USER_ID));
    assert!(!lineage.nodes[1].has_capability(CAPABILITY_SHARED_USER_ID));

    let oldest = summarize_certificate(lineage.nodes[0].certificate).unwrap();
    assert!(oldest.subject.contains("CN=old signer"));
    let newest = summarize_certificate(lineage.nodes[1].certificate).unwrap();
    assert!(newest.subject.contains("CN=new signer"));
}
