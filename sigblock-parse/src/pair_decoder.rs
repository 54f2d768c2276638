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

use log::trace;
use sigblock_common::*;

use crate::{byte_cursor::ByteCursor, signing_types::Pair};

/// Splits the signing block payload (everything between the two size fields)
/// into its ID-value pairs.
///
/// Each pair is `length: u64 || id: u32 || value`, where `length` counts the
/// ID and the value. The pairs must tile the payload exactly. Duplicate IDs
/// are kept, in order.
///
/// `base_offset` is the payload's offset within the block, so that
/// [Pair::offset] is relative to the block rather than the payload.
pub fn decode_pairs(payload: &[u8], base_offset: usize) -> Result<Vec<Pair<'_>>> {
    let mut cursor = ByteCursor::new(payload);
    let mut pairs = vec![];

    while !cursor.is_at_end() {
        let offset = base_offset + cursor.position();
        let length = cursor.read_u64()?;
        if length < 4 {
            return Err(SigBlockError::MalformedPair(format!(
                "pair at offset {offset} declares length {length}, too short for its ID"
            )));
        }
        let mut pair = ByteCursor::new(cursor.read_bytes(length)?);
        let id = pair.read_u32()?;
        let value = pair.read_rest();
        trace!("pair {:#010x} at offset {offset}, {} value bytes", id, value.len());
        pairs.push(Pair { id, value, offset });
    }

    Ok(pairs)
}
