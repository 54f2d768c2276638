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

use std::{io, sync::Arc};

use deku::prelude::*;
use rsa::pkcs8;
use thiserror::Error;

/// Common error type making it easier to share `Result`s between sigblock crates.
///
/// In general designed to avoid needing utilities like `map_err`.
#[derive(Debug, Clone, Error)]
pub enum SigBlockError {
    /// A length field declared more bytes than are left in the enclosing
    /// region. This applies at every nesting level, from the outer block
    /// down to a single digest.
    #[error("truncated data: needed {needed} bytes but only {remaining} remain")]
    TruncatedData { needed: u64, remaining: u64 },
    /// The last 16 bytes of the candidate block are not `APK Sig Block 42`.
    #[error("invalid signing block magic {0:02x?}")]
    InvalidMagic([u8; 16]),
    /// The two copies of the block size disagree, or the block size does not
    /// describe the region it was read from.
    #[error("signing block size mismatch: expected {expected}, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    /// A pair, signer record or nested sequence is inconsistent with its own
    /// framing. For example an ID-value pair shorter than its ID, or a
    /// record whose contents don't use up its declared length.
    #[error("malformed pair: {0}")]
    MalformedPair(String),
    /// The certificate decoder rejected a certificate's DER bytes. The string
    /// is the decoder's own description of the problem.
    #[error("certificate decoding failed: {0}")]
    CertificateDecodeError(String),
    /// A signer's public key could not be read as a SubjectPublicKeyInfo.
    #[error("public key decoding failed: {0}")]
    PublicKeyDecodeError(String),
    /// The ZIP End Of Central Directory record couldn't be found, or it
    /// points somewhere that can't be right.
    #[error("zip parsing failed: {0}")]
    ZipParsingFailed(String),
    /// A fixed-layout record (block footer, EOCD) could not be read.
    /// See [DekuError].
    #[error("byte decoding failed: {0}")]
    ByteDecodingFailed(DekuError),
    /// sigblock-cli encountered an error while processing something specific
    /// to the command line implementation.
    #[error("{0}")]
    Cli(String),
    /// An error occurred while reading an input file. Only `sigblock-cli`
    /// touches the disk.
    #[error("file I/O failed: {0}")]
    FileIoError(Arc<io::Error>)
}

/// Result type where the error is always [SigBlockError].
pub type Result<T> = std::result::Result<T, SigBlockError>;

impl SigBlockError {
    /// Shorthand used by every bounds check.
    pub fn truncated(needed: u64, remaining: usize) -> Self {
        SigBlockError::TruncatedData {
            needed,
            remaining: remaining as u64
        }
    }
}

/// Makes it easy to hand errors to callers that only deal in strings
impl From<SigBlockError> for String {
    fn from(value: SigBlockError) -> Self {
        value.to_string()
    }
}

// Automatic conversion from other types of error to SigBlockError makes the rest of the code cleaner
impl From<io::Error> for SigBlockError {
    fn from(value: io::Error) -> Self {
        SigBlockError::FileIoError(value.into())
    }
}

impl From<DekuError> for SigBlockError {
    fn from(value: DekuError) -> Self {
        SigBlockError::ByteDecodingFailed(value)
    }
}

impl From<rasn::error::DecodeError> for SigBlockError {
    fn from(value: rasn::error::DecodeError) -> Self {
        SigBlockError::CertificateDecodeError(value.to_string())
    }
}

impl From<rasn::error::EncodeError> for SigBlockError {
    fn from(value: rasn::error::EncodeError) -> Self {
        SigBlockError::CertificateDecodeError(value.to_string())
    }
}

impl From<pkcs8::spki::Error> for SigBlockError {
    fn from(value: pkcs8::spki::Error) -> Self {
        SigBlockError::PublicKeyDecodeError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn read() -> Result<Vec<u8>> {
            Ok(std::fs::read("/definitely/not/a/real/path.apk")?)
        }
        assert!(matches!(read(), Err(SigBlockError::FileIoError(_))));
    }

    #[test]
    fn errors_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SigBlockError>();

        let err = std::thread::spawn(|| -> Result<()> {
            std::fs::read("/definitely/not/a/real/path.apk")?;
            Ok(())
        })
        .join()
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, SigBlockError::FileIoError(_)));
    }

    #[test]
    fn errors_render_for_string_callers() {
        let message: String = SigBlockError::truncated(8, 3).into();
        assert_eq!(message, "truncated data: needed 8 bytes but only 3 remain");
    }
}
