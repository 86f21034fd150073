//! Compressed snapshots for the Trine triple store.
//!
//! A [`Snapshot`] is a read-only copy of a live index, re-encoded for a
//! smaller footprint. It owns all of its data: mutating the live engine after
//! a snapshot is built does not affect it.
//!
//! # Encoders
//!
//! - [`CsrMatrix`] -- subject → sorted objects as row offsets + column ids
//! - [`RleBitVector`] -- presence bits as (value, length) runs
//! - [`DictionaryColumn`] -- subject → small object codes, for predicates whose
//!   object domain is small relative to their triple count
//! - [`EncodedStringTable`] -- the term table with namespace prefixes stored once
//!
//! Every encoder is lossless and build-once: answers from the encoded form
//! equal answers from the source it was built from. There is no incremental
//! update; rebuild from a fresh index instead.
//!
//! # Byte format
//!
//! [`Snapshot::to_bytes`] frames a bincode payload as
//! `"TRNS" | version (u32 BE) | raw length (varint) | zstd payload | crc32 (u32 BE)`.

pub mod codec;
pub mod csr;
pub mod dictionary;
pub mod error;
pub mod rle;
pub mod snapshot;
pub mod strings;

pub use csr::CsrMatrix;
pub use dictionary::{CodeWidth, Codes, DictionaryColumn};
pub use error::{CompressError, CompressResult};
pub use rle::{Run, RleBitVector};
pub use snapshot::{CompressedPredicate, ObjectLayout, Snapshot, SnapshotConfig, SnapshotStats};
pub use strings::EncodedStringTable;
