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

//! Just enough ZIP to find the APK Signing Block: the End Of Central
//! Directory record, the central directory offset it points to, and the
//! bytes right before that offset.

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod region;
mod zip_parser;

pub use region::{locate_signing_block, signing_block_region, SigningBlockRegion};
pub use zip_parser::{find_offsets, EndOfCentralDirectory, ZipOffsets, EOCD_LEN, EOCD_MAGIC};
