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

//! Small in-memory APKs for tests.

use std::io::{Cursor, Write};

use sigblock_common::*;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::zip_parser::find_offsets;

// Android requires resources.arsc to be stored uncompressed
const UNCOMPRESSED_FILES: &[&str] = &["resources.arsc"];

fn zip_error(e: ZipError) -> SigBlockError {
    SigBlockError::ZipParsingFailed(e.to_string())
}

/// Zips `(path, contents)` entries into a buffer, compressed the way an APK
/// would be.
pub fn write_archive(files: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    write_archive_with_comment(files, "")
}

pub fn write_archive_with_comment(files: &[(&str, &[u8])], comment: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let compressed_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .with_alignment(4);
    let uncompressed_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .with_alignment(4);

    for (path, data) in files {
        let options = if UNCOMPRESSED_FILES.contains(path) {
            uncompressed_options
        } else {
            compressed_options
        };
        zip.start_file(*path, options).map_err(zip_error)?;
        zip.write_all(data)?;
    }
    if !comment.is_empty() {
        zip.set_comment(comment);
    }

    Ok(zip.finish().map_err(zip_error)?.into_inner())
}

/// Places `block` right before the central directory and moves the EOCD's
/// central directory offset along with it, like a v2+ signer does.
pub fn insert_signing_block(zip_buf: &[u8], block: &[u8]) -> Result<Vec<u8>> {
    let offsets = find_offsets(zip_buf)?;
    let moved_cd_start = u32::try_from(offsets.cd_start + block.len())
        .map_err(|_| SigBlockError::ZipParsingFailed("archive too large for a 32 bit offset".into()))?;

    let mut out = Vec::with_capacity(zip_buf.len() + block.len());
    out.extend_from_slice(&zip_buf[..offsets.cd_start]);
    out.extend_from_slice(block);
    out.extend_from_slice(&zip_buf[offsets.cd_start..]);

    let cd_offset_field = offsets.eocd_start + block.len() + 16;
    out[cd_offset_field..cd_offset_field + 4].copy_from_slice(&moved_cd_start.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_block_sits_before_the_central_directory() {
        let zip = write_archive(&[("classes.dex", b"dex\n035".as_slice())]).unwrap();
        let before = find_offsets(&zip).unwrap();

        let signed = insert_signing_block(&zip, &[0xab; 40]).unwrap();
        let after = find_offsets(&signed).unwrap();

        assert_eq!(signed.len(), zip.len() + 40);
        assert_eq!(after.cd_start, before.cd_start + 40);
        assert_eq!(after.cd_size, before.cd_size);
        assert_eq!(&signed[before.cd_start..after.cd_start], &[0xab; 40]);
    }

    #[test]
    fn stored_entries_stay_readable() {
        let zip = write_archive(&[("resources.arsc", b"table".as_slice())]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
        let entry = archive.by_name("resources.arsc").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
    }
}
