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

//! Bounds-checked little-endian reading over a borrowed byte region.
//!
//! Every structure in the signing block is a length-prefixed region nested
//! in another one. [ByteCursor] reads one region, and hands out child
//! cursors for the regions inside it, so no decoder can ever step outside
//! the span it was given.

use byteorder::{ByteOrder, LittleEndian};
use sigblock_common::*;

/// A saved cursor position, see [ByteCursor::mark].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor { data, pos: 0 }
    }

    /// Offset of the next unread byte, relative to the start of this cursor's region.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    /// Rewinds (or fast-forwards) to a position previously returned by [mark](ByteCursor::mark).
    pub fn reset(&mut self, mark: Mark) -> Result<()> {
        if mark.0 > self.data.len() {
            return Err(SigBlockError::truncated(mark.0 as u64, self.data.len()));
        }
        self.pos = mark.0;
        Ok(())
    }

    /// Returns the next `n` bytes without copying them.
    ///
    /// `n` is a `u64` because that's what the outer block's length fields are,
    /// and an untrusted length must be checked before it is ever narrowed.
    pub fn read_bytes(&mut self, n: u64) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining as u64 {
            return Err(SigBlockError::truncated(n, remaining));
        }
        // Can't truncate, n <= remaining
        let n = n as usize;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Reads a u32 length and then that many bytes.
    ///
    /// If the length is fine but the bytes aren't there, the cursor is left
    /// where it was so the caller can report the position of the bad prefix.
    pub fn read_u32_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let mark = self.mark();
        let length = self.read_u32()?;
        self.read_bytes(length as u64).inspect_err(|_| self.pos = mark.0)
    }

    /// Reads a u64 length and then that many bytes. The outer signing block
    /// pairs are framed this way, everything inside them uses u32.
    pub fn read_u64_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let mark = self.mark();
        let length = self.read_u64()?;
        self.read_bytes(length).inspect_err(|_| self.pos = mark.0)
    }

    /// Like [read_u32_length_prefixed](ByteCursor::read_u32_length_prefixed)
    /// but returns a cursor bounded to the prefixed region.
    pub fn read_u32_length_prefixed_cursor(&mut self) -> Result<ByteCursor<'a>> {
        Ok(ByteCursor::new(self.read_u32_length_prefixed()?))
    }

    /// Everything that hasn't been read yet, consuming it.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    /// Fails with [SigBlockError::MalformedPair] if the region has unread
    /// bytes left, i.e. its declared length was larger than its contents.
    pub fn expect_end(&self, what: &str) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            left => Err(SigBlockError::MalformedPair(format!(
                "{what} has {left} unused bytes after offset {}",
                self.pos
            )))
        }
    }
}

/// Reads a u32 length-prefixed sequence of u32 length-prefixed entries,
/// decoding each entry with `decode_entry` inside its own bounded cursor.
///
/// This is the shape of nearly every list in the signature scheme blocks:
/// signers, digests, certificates, signatures and attributes. Each entry must
/// be fully consumed by `decode_entry`.
pub fn read_length_prefixed_sequence<'a, T>(
    cursor: &mut ByteCursor<'a>,
    what: &str,
    mut decode_entry: impl FnMut(&mut ByteCursor<'a>) -> Result<T>
) -> Result<Vec<T>> {
    let mut sequence = cursor.read_u32_length_prefixed_cursor()?;
    let mut entries = vec![];
    while !sequence.is_at_end() {
        let mut entry = sequence.read_u32_length_prefixed_cursor()?;
        entries.push(decode_entry(&mut entry)?);
        entry.expect_end(what)?;
    }
    Ok(entries)
}
