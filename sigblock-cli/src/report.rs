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

use std::io::Write;

use sigblock_api::{
    ids::block_id_name, summarize_signer, CertificateSummary, Inspection, RasnCertificateDecoder,
    Result, SchemeInspection, Signer
};

// Digests longer than this are shortened in the report
const MAX_DIGEST_HEX: usize = 64;

/// What goes into the report besides the block structure.
pub struct ReportOptions {
    /// Decode and describe each certificate
    pub certificates: bool,
    /// Also print each certificate as PEM
    pub pem: bool
}

/// Writes a human-readable description of a signing block to `out`.
pub fn write_report(out: &mut impl Write, inspection: &Inspection<'_>, options: &ReportOptions) -> Result<()> {
    let block = &inspection.block;
    match block.offset {
        Some(offset) => write!(out, "Signing block at offset {offset}")?,
        None => write!(out, "Signing block")?
    }
    writeln!(out, ", {} bytes, {} pairs", block.total_len(), block.pairs.len())?;
    for pair in &block.pairs {
        writeln!(
            out,
            "  {:#010x}  {:<28} {:>10} bytes",
            pair.id,
            pair.name().unwrap_or("(unknown)"),
            pair.value.len()
        )?;
    }

    for scheme in &inspection.schemes {
        writeln!(out)?;
        write_scheme(out, scheme, options)?;
    }
    Ok(())
}

fn write_scheme(out: &mut impl Write, scheme: &SchemeInspection<'_>, options: &ReportOptions) -> Result<()> {
    let name = block_id_name(scheme.descriptor.id).unwrap_or(scheme.descriptor.name);
    let signers = match &scheme.signers {
        Ok(signers) => signers,
        Err(e) => {
            writeln!(out, "{name}: failed to decode: {e}")?;
            return Ok(());
        }
    };

    let plural = if signers.len() == 1 { "" } else { "s" };
    writeln!(out, "{name}: {} signer{plural}", signers.len())?;
    for (i, signer) in signers.iter().enumerate() {
        writeln!(out, "  Signer #{}", i + 1)?;
        write_signer(out, signer, options)?;
    }
    Ok(())
}

fn write_signer(out: &mut impl Write, signer: &Signer<'_>, options: &ReportOptions) -> Result<()> {
    if let Some(range) = signer.sdk_range {
        writeln!(out, "    SDK range: {}..={}", range.min_sdk, range.max_sdk)?;
    }
    for digest in &signer.signed_data.digests {
        writeln!(
            out,
            "    Digest: {} ({:#06x}) {}",
            digest.algorithm().name(),
            digest.signature_algorithm_id,
            short_hex(digest.digest)
        )?;
    }
    for signature in &signer.signatures {
        writeln!(
            out,
            "    Signature: {} ({:#06x}), {} bytes",
            signature.algorithm().name(),
            signature.signature_algorithm_id,
            signature.signature.len()
        )?;
    }
    for attribute in &signer.signed_data.additional_attributes {
        writeln!(
            out,
            "    Attribute: {:#010x} {:?}, {} bytes",
            attribute.id,
            attribute.kind(),
            attribute.value.len()
        )?;
    }
    if let Some(lineage) = signer.signed_data.proof_of_rotation() {
        match lineage {
            Ok(lineage) => writeln!(out, "    Proof of rotation: {} certificates", lineage.nodes.len())?,
            Err(e) => writeln!(out, "    Proof of rotation: {e}")?
        }
    }

    if !options.certificates {
        writeln!(out, "    Certificates: {}", signer.signed_data.certificates.len())?;
        return Ok(());
    }

    let summary = summarize_signer(signer, &RasnCertificateDecoder);
    match summary.public_key {
        Ok(key) => {
            write!(out, "    Public key: {}", key.algorithm.display_name())?;
            if let Some(bits) = key.rsa_modulus_bits {
                write!(out, " {bits} bit")?;
            }
            writeln!(out, ", SHA-256 {}", key.sha256_fingerprint_hex())?;
        }
        Err(e) => writeln!(out, "    Public key: {e}")?
    }
    for (i, certificate) in summary.certificates.iter().enumerate() {
        match certificate {
            Ok(certificate) => write_certificate(out, i + 1, certificate, options)?,
            Err(e) => writeln!(out, "    Certificate #{}: {e}", i + 1)?
        }
    }
    Ok(())
}

fn write_certificate(
    out: &mut impl Write,
    number: usize,
    certificate: &CertificateSummary,
    options: &ReportOptions
) -> Result<()> {
    writeln!(out, "    Certificate #{number}: {}", certificate.subject)?;
    if certificate.is_self_issued() {
        writeln!(out, "      Issuer: (self)")?;
    } else {
        writeln!(out, "      Issuer: {}", certificate.issuer)?;
    }
    writeln!(out, "      Serial: {}", certificate.serial_number_hex())?;
    writeln!(
        out,
        "      Valid: {} to {}",
        certificate.not_before.to_rfc3339(),
        certificate.not_after.to_rfc3339()
    )?;
    writeln!(
        out,
        "      Signature algorithm: {}",
        certificate.signature_algorithm.display_name()
    )?;
    writeln!(out, "      SHA-256: {}", certificate.sha256_fingerprint_hex())?;
    writeln!(out, "      MD5: {}", certificate.md5_fingerprint_hex())?;
    if options.pem {
        write!(out, "{}", certificate.to_pem())?;
    }
    Ok(())
}

fn short_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    if full.len() <= MAX_DIGEST_HEX {
        full
    } else {
        format!("{}...", &full[..MAX_DIGEST_HEX])
    }
}
