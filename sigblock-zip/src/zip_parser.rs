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
use log::{debug, trace};
use sigblock_common::*;

pub const EOCD_MAGIC: &[u8; 4] = b"PK\x05\x06";
/// Size of the EOCD record without its trailing comment
pub const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = u16::MAX as usize;
// Offsets this large mean the real values live in a ZIP64 record
const ZIP64_MARKER: u32 = u32::MAX;

#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub struct ZipOffsets {
    // Central Directory (from start of file)
    pub cd_start: usize,
    pub cd_size: usize,
    // End of Central Directory (from start of file)
    pub eocd_start: usize
}

#[derive(Debug, PartialEq, DekuRead)]
#[deku(endian = "little", magic = b"PK\x05\x06")]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub cd_disk_number: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16
}

/// Finds the End Of Central Directory record and the central directory it
/// describes.
///
/// The record sits within the last `22 + 65535` bytes, and its comment has
/// to run exactly to the end of the file. A signature-looking sequence that
/// doesn't satisfy that (say, inside the comment) is skipped.
pub fn find_offsets(zip_buf: &[u8]) -> Result<ZipOffsets> {
    if zip_buf.len() < EOCD_LEN {
        return Err(SigBlockError::ZipParsingFailed(format!(
            "{} bytes is too short to hold an end of central directory record",
            zip_buf.len()
        )));
    }

    let search_start = zip_buf.len().saturating_sub(EOCD_LEN + MAX_COMMENT_LEN);
    for i in (search_start..=(zip_buf.len() - EOCD_LEN)).rev() {
        if &zip_buf[i..(i + 4)] != EOCD_MAGIC {
            continue;
        }
        let Ok((_, eocd)) = EndOfCentralDirectory::from_bytes((&zip_buf[i..], 0)) else {
            continue;
        };
        if i + EOCD_LEN + eocd.comment_len as usize != zip_buf.len() {
            trace!("Skipping EOCD signature at {i}, its comment doesn't reach the end");
            continue;
        }

        // Found the end of central directory!
        debug!("End of central directory at {i}: {eocd:?}");
        return offsets_from_record(&eocd, i);
    }

    Err(SigBlockError::ZipParsingFailed(
        "no end of central directory record".into()
    ))
}

fn offsets_from_record(eocd: &EndOfCentralDirectory, eocd_start: usize) -> Result<ZipOffsets> {
    if eocd.cd_offset == ZIP64_MARKER || eocd.cd_size == ZIP64_MARKER {
        return Err(SigBlockError::ZipParsingFailed("ZIP64 archives are not supported".into()));
    }

    // The central directory has to end right where the EOCD starts
    let cd_end = eocd.cd_offset as u64 + eocd.cd_size as u64;
    if cd_end != eocd_start as u64 {
        return Err(SigBlockError::ZipParsingFailed(format!(
            "central directory at {} with size {} does not end at the EOCD ({eocd_start})",
            eocd.cd_offset, eocd.cd_size
        )));
    }

    Ok(ZipOffsets {
        cd_start: eocd.cd_offset as usize,
        cd_size: eocd.cd_size as usize,
        eocd_start
    })
}
