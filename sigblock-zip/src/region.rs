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

use deku::prelude::*;
use log::debug;
use sigblock_common::*;
use sigblock_parse::{ids::APK_SIGNING_BLOCK_MAGIC, BlockFooter};

use crate::zip_parser::{find_offsets, ZipOffsets};

// Trailing size field plus magic
const FOOTER_LEN: usize = 8 + 16;

/// The bytes of a signing block carved out of an APK, ready for
/// `SigningBlock::parse_before_central_directory`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SigningBlockRegion<'a> {
    pub bytes: &'a [u8],
    /// Absolute offset of the block's first byte
    pub start: u64,
    pub central_directory_offset: u64
}

/// Carves out the signing block that ends where the central directory
/// starts.
///
/// Returns `None` when the 16 bytes before the central directory aren't the
/// signing block magic, which is what an APK signed only with v1 (or not at
/// all) looks like. Only the trailing size is read here. The block's own
/// parser checks it against the leading one.
pub fn signing_block_region<'a>(
    zip_buf: &'a [u8],
    offsets: &ZipOffsets
) -> Result<Option<SigningBlockRegion<'a>>> {
    let cd_start = offsets.cd_start;
    if cd_start > zip_buf.len() {
        return Err(SigBlockError::ZipParsingFailed(format!(
            "central directory offset {cd_start} is past the end of the file"
        )));
    }
    if cd_start < FOOTER_LEN {
        return Ok(None);
    }

    let (_, footer) = BlockFooter::from_bytes((&zip_buf[cd_start - FOOTER_LEN..cd_start], 0))?;
    if &footer.magic != APK_SIGNING_BLOCK_MAGIC {
        debug!("No signing block before the central directory at {cd_start}");
        return Ok(None);
    }

    // The size doesn't count the leading size field
    let total_len = footer.size_of_block.checked_add(8).ok_or(SigBlockError::TruncatedData {
        needed: u64::MAX,
        remaining: cd_start as u64
    })?;
    let start = (cd_start as u64)
        .checked_sub(total_len)
        .ok_or(SigBlockError::TruncatedData {
            needed: total_len,
            remaining: cd_start as u64
        })?;
    debug!("Signing block spans {start}..{cd_start}");

    Ok(Some(SigningBlockRegion {
        bytes: &zip_buf[start as usize..cd_start],
        start,
        central_directory_offset: cd_start as u64
    }))
}

/// [find_offsets] followed by [signing_block_region].
pub fn locate_signing_block(zip_buf: &[u8]) -> Result<Option<SigningBlockRegion<'_>>> {
    let offsets = find_offsets(zip_buf)?;
    signing_block_region(zip_buf, &offsets)
}
