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

//! Builders for synthetic signing blocks.
//!
//! These exist for tests only (enable the `fixtures` feature from other
//! crates' dev-dependencies). They write the same layout the decoders read,
//! and deliberately don't validate anything so tests can build broken blocks.

use crate::ids::APK_SIGNING_BLOCK_MAGIC;

// Length-prefixes some bytes with a u32, as used inside the scheme blocks
pub fn len_pfx_u32(bytes: &[u8]) -> Vec<u8> {
    let mut out = (bytes.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(bytes);
    out
}

// Length-prefixes some bytes with a u64, as used by the outer pairs
pub fn len_pfx_u64(bytes: &[u8]) -> Vec<u8> {
    let mut out = (bytes.len() as u64).to_le_bytes().to_vec();
    out.extend_from_slice(bytes);
    out
}

/// A length-prefixed list of length-prefixed entries.
pub fn len_pfx_sequence<T: AsRef<[u8]>>(entries: &[T]) -> Vec<u8> {
    let body: Vec<u8> = entries
        .iter()
        .flat_map(|entry| len_pfx_u32(entry.as_ref()))
        .collect();
    len_pfx_u32(&body)
}

/// `id || length-prefixed bytes` entries, the shape of digests and signatures.
pub fn id_and_bytes(id: u32, bytes: &[u8]) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    out.extend(len_pfx_u32(bytes));
    out
}

/// The pairs part of a signing block.
pub fn encode_pairs(pairs: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![];
    for (id, value) in pairs {
        let mut pair = id.to_le_bytes().to_vec();
        pair.extend_from_slice(value);
        out.extend(len_pfx_u64(&pair));
    }
    out
}

/// A complete signing block: both size fields, the pairs and the magic.
pub fn encode_signing_block(pairs: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let pairs = encode_pairs(pairs);
    // Plus size_of_self_counted plus magic
    let size_of_block = (pairs.len() + 8 + 16) as u64;
    let mut out = size_of_block.to_le_bytes().to_vec();
    out.extend(pairs);
    out.extend(size_of_block.to_le_bytes());
    out.extend(APK_SIGNING_BLOCK_MAGIC);
    out
}

#[derive(Debug, Clone, Default)]
pub struct SignerFixture {
    pub digests: Vec<(u32, Vec<u8>)>,
    pub certificates: Vec<Vec<u8>>,
    pub attributes: Vec<(u32, Vec<u8>)>,
    pub signatures: Vec<(u32, Vec<u8>)>,
    pub public_key: Vec<u8>,
    // Written by v3 signers, both in the signed data and the signer itself
    pub sdk_range: Option<(u32, u32)>
}

impl SignerFixture {
    /// The signed data, without its own length prefix.
    pub fn signed_data(&self) -> Vec<u8> {
        let digests: Vec<_> = self
            .digests
            .iter()
            .map(|(id, digest)| id_and_bytes(*id, digest))
            .collect();
        let attributes: Vec<_> = self
            .attributes
            .iter()
            .map(|(id, value)| {
                let mut attr = id.to_le_bytes().to_vec();
                attr.extend_from_slice(value);
                attr
            })
            .collect();

        let mut out = len_pfx_sequence(&digests);
        out.extend(len_pfx_sequence(&self.certificates));
        if let Some((min_sdk, max_sdk)) = self.sdk_range {
            out.extend(min_sdk.to_le_bytes());
            out.extend(max_sdk.to_le_bytes());
        }
        out.extend(len_pfx_sequence(&attributes));
        out
    }

    /// The signer record, without its own length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let signatures: Vec<_> = self
            .signatures
            .iter()
            .map(|(id, signature)| id_and_bytes(*id, signature))
            .collect();

        let mut out = len_pfx_u32(&self.signed_data());
        if let Some((min_sdk, max_sdk)) = self.sdk_range {
            out.extend(min_sdk.to_le_bytes());
            out.extend(max_sdk.to_le_bytes());
        }
        out.extend(len_pfx_sequence(&signatures));
        out.extend(len_pfx_u32(&self.public_key));
        out
    }
}

/// The value of a signature scheme pair holding the given signers.
pub fn encode_scheme_block(signers: &[SignerFixture]) -> Vec<u8> {
    let signers: Vec<_> = signers.iter().map(SignerFixture::encode).collect();
    len_pfx_sequence(&signers)
}

#[derive(Debug, Clone, Default)]
pub struct LineageNodeFixture {
    pub certificate: Vec<u8>,
    pub parent_signature_algorithm_id: u32,
    pub flags: u32,
    pub signature_algorithm_id: u32,
    pub signature: Vec<u8>
}

/// The value of a proof-of-rotation attribute.
pub fn encode_lineage(version: u32, nodes: &[LineageNodeFixture]) -> Vec<u8> {
    let mut out = version.to_le_bytes().to_vec();
    for node in nodes {
        let mut signed_data = len_pfx_u32(&node.certificate);
        signed_data.extend(node.parent_signature_algorithm_id.to_le_bytes());

        let mut encoded = len_pfx_u32(&signed_data);
        encoded.extend(node.flags.to_le_bytes());
        encoded.extend(node.signature_algorithm_id.to_le_bytes());
        encoded.extend(len_pfx_u32(&node.signature));
        out.extend(len_pfx_u32(&encoded));
    }
    out
}

/// One signer with two fake certificates and one RSA signature.
pub fn sample_signer() -> SignerFixture {
    SignerFixture {
        digests: vec![(0x0103, vec![0xd1; 32])],
        certificates: vec![b"first certificate".to_vec(), b"second certificate".to_vec()],
        attributes: vec![],
        signatures: vec![(0x0103, vec![0x5e; 256])],
        public_key: b"public key".to_vec(),
        sdk_range: None
    }
}
