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

use crate::{
    byte_cursor::ByteCursor,
    ids::APK_SIGNING_BLOCK_MAGIC,
    pair_decoder::decode_pairs,
    signing_types::{Pair, SigningBlock}
};

// Leading size field
const HEADER_LEN: usize = 8;
// Trailing size field plus magic
const FOOTER_LEN: usize = 8 + 16;
pub const MIN_SIGNING_BLOCK_LEN: usize = HEADER_LEN + FOOTER_LEN;

/// The last 24 bytes of the block. Having the size right before the magic
/// lets a reader find the start of the block by walking backwards from the
/// central directory.
#[derive(Debug, PartialEq, DekuRead)]
#[deku(endian = "little")]
pub struct BlockFooter {
    pub size_of_block: u64,
    pub magic: [u8; 16]
}

impl<'a> SigningBlock<'a> {
    /// Validates the framing of a standalone signing block and decodes its pairs.
    ///
    /// `region` must be exactly the block: leading size field first, magic last.
    pub fn parse(region: &'a [u8]) -> Result<SigningBlock<'a>> {
        if region.len() < MIN_SIGNING_BLOCK_LEN {
            return Err(SigBlockError::truncated(
                MIN_SIGNING_BLOCK_LEN as u64,
                region.len()
            ));
        }

        let size_of_block = ByteCursor::new(region).read_u64()?;
        let footer_bytes = &region[region.len() - FOOTER_LEN..];
        let (_, footer) = BlockFooter::from_bytes((footer_bytes, 0))?;
        let total_len = region.len() as u64;

        if &footer.magic != APK_SIGNING_BLOCK_MAGIC {
            // If the header claims more bytes than we were given, we were most
            // likely handed the front of a cut-off block, not a corrupt one.
            if size_of_block.saturating_add(HEADER_LEN as u64) > total_len {
                return Err(SigBlockError::truncated(
                    size_of_block.saturating_add(HEADER_LEN as u64),
                    region.len()
                ));
            }
            return Err(SigBlockError::InvalidMagic(footer.magic));
        }

        if footer.size_of_block != size_of_block {
            return Err(SigBlockError::SizeMismatch {
                expected: size_of_block,
                actual: footer.size_of_block
            });
        }

        // The size counts everything after the leading size field
        if size_of_block.checked_add(HEADER_LEN as u64) != Some(total_len) {
            return Err(SigBlockError::SizeMismatch {
                expected: size_of_block,
                actual: total_len - HEADER_LEN as u64
            });
        }

        let payload = &region[HEADER_LEN..region.len() - FOOTER_LEN];
        let pairs = decode_pairs(payload, HEADER_LEN)?;
        debug!(
            "signing block of {} bytes holds {} pairs",
            total_len,
            pairs.len()
        );

        Ok(SigningBlock {
            size_of_block,
            offset: None,
            pairs
        })
    }

    /// Like [parse](SigningBlock::parse), for a region that ends where the
    /// ZIP central directory starts. `central_directory_offset` is the
    /// absolute file offset of the central directory, used to work out (and
    /// sanity check) where the block itself starts.
    pub fn parse_before_central_directory(
        region: &'a [u8],
        central_directory_offset: u64
    ) -> Result<SigningBlock<'a>> {
        let block_offset = central_directory_offset
            .checked_sub(region.len() as u64)
            .ok_or(SigBlockError::SizeMismatch {
                expected: region.len() as u64,
                actual: central_directory_offset
            })?;
        let mut block = SigningBlock::parse(region)?;
        block.offset = Some(block_offset);
        Ok(block)
    }

    /// Total length of the block in bytes, both size fields and the magic included.
    pub fn total_len(&self) -> u64 {
        self.size_of_block + HEADER_LEN as u64
    }

    /// The first pair with the given ID. If an ID appears more than once,
    /// the first one is the one the rest of this crate decodes.
    pub fn find_pair(&self, id: u32) -> Option<&Pair<'a>> {
        self.pairs.iter().find(|pair| pair.id == id)
    }

    /// Every pair with the given ID, in block order.
    pub fn pairs_with_id(&self, id: u32) -> impl Iterator<Item = &Pair<'a>> {
        self.pairs.iter().filter(move |pair| pair.id == id)
    }
}
