//! Byte framing for [`Snapshot`]s.
//!
//! ```text
//! "TRNS" | version: u32 BE | raw length: varint | zstd(bincode(snapshot)) | crc32(zstd bytes): u32 BE
//! ```

use std::path::Path;

use tracing::debug;

use crate::error::{CompressError, CompressResult};
use crate::snapshot::Snapshot;

pub const MAGIC: &[u8; 4] = b"TRNS";
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 4;

/// Largest decoded payload accepted; the output buffer is allocated up front.
pub const MAX_PAYLOAD_LEN: u64 = 1 << 30;

impl Snapshot {
    /// Encode into the framed byte format.
    pub fn to_bytes(&self, zstd_level: i32) -> CompressResult<Vec<u8>> {
        let payload = bincode::serialize(self).map_err(|e| CompressError::Serialization(e.to_string()))?;
        let compressed = zstd::encode_all(payload.as_slice(), zstd_level)
            .map_err(|e| CompressError::Compression(e.to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_LEN + 10 + compressed.len() + TRAILER_LEN);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_be_bytes());
        encode_varint(&mut buf, payload.len() as u64);
        buf.extend_from_slice(&compressed);
        buf.extend_from_slice(&crc32fast::hash(&compressed).to_be_bytes());

        debug!(raw = payload.len(), encoded = buf.len(), "encoded snapshot");
        Ok(buf)
    }

    /// Decode and verify the framed byte format.
    pub fn from_bytes(data: &[u8]) -> CompressResult<Self> {
        if data.len() < HEADER_LEN + 1 + TRAILER_LEN {
            return Err(CompressError::Corrupt("too short".into()));
        }
        if &data[0..4] != MAGIC {
            return Err(CompressError::InvalidMagic {
                expected: String::from_utf8_lossy(MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = read_u32(&data[4..8]);
        if version != VERSION {
            return Err(CompressError::UnsupportedVersion(version));
        }

        let body_end = data.len() - TRAILER_LEN;
        let (raw_len, consumed) = decode_varint(&data[HEADER_LEN..body_end])?;
        let compressed = &data[HEADER_LEN + consumed..body_end];

        let expected = read_u32(&data[body_end..]);
        let computed = crc32fast::hash(compressed);
        if expected != computed {
            return Err(CompressError::ChecksumMismatch { expected, computed });
        }

        if raw_len > MAX_PAYLOAD_LEN {
            return Err(CompressError::Corrupt(format!(
                "declared payload of {raw_len} bytes exceeds limit of {MAX_PAYLOAD_LEN}"
            )));
        }
        let payload = zstd::bulk::decompress(compressed, raw_len as usize)
            .map_err(|e| CompressError::Compression(e.to_string()))?;
        if payload.len() as u64 != raw_len {
            return Err(CompressError::Corrupt(format!(
                "size mismatch: expected {raw_len}, got {}",
                payload.len()
            )));
        }

        let snapshot: Snapshot =
            bincode::deserialize(&payload).map_err(|e| CompressError::Serialization(e.to_string()))?;
        snapshot.validate()?;
        debug!(
            predicates = snapshot.predicate_count(),
            triples = snapshot.len(),
            "decoded snapshot"
        );
        Ok(snapshot)
    }

    /// Write the framed bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>, zstd_level: i32) -> CompressResult<()> {
        std::fs::write(path.as_ref(), self.to_bytes(zstd_level)?)?;
        debug!(path = %path.as_ref().display(), "saved snapshot");
        Ok(())
    }

    /// Read and verify a snapshot written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> CompressResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(word)
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> CompressResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= u64::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(CompressError::Corrupt("varint overflow".into()));
        }
    }
    Err(CompressError::Corrupt("truncated varint".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotConfig;
    use trine_index::TripleIndex;
    use trine_intern::Interner;
    use trine_types::{Capacity, TermId};

    fn sample() -> Snapshot {
        let mut terms = Interner::new();
        let mut idx = TripleIndex::new(Capacity::uniform(256)).unwrap();
        let knows = terms.intern("http://xmlns.com/foaf/0.1/knows").unwrap();
        let people: Vec<TermId> = (0..20)
            .map(|i| terms.intern(&format!("http://ex.org/p{i}")).unwrap())
            .collect();
        for w in people.windows(2) {
            idx.insert(w[0], knows, w[1]).unwrap();
        }
        Snapshot::build(&idx, Some(&terms), &SnapshotConfig::default()).unwrap()
    }

    // ----------------------------------------------------------------
    // Varint
    // ----------------------------------------------------------------

    #[test]
    fn varint_roundtrip() {
        for value in [0u64, 1, 127, 128, 300, 1_000_000, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(&mut buf, value);
            let (decoded, consumed) = decode_varint(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn varint_truncated() {
        assert!(matches!(decode_varint(&[0x80]), Err(CompressError::Corrupt(_))));
        assert!(matches!(decode_varint(&[]), Err(CompressError::Corrupt(_))));
    }

    // ----------------------------------------------------------------
    // Framing
    // ----------------------------------------------------------------

    #[test]
    fn bytes_roundtrip() {
        let snap = sample();
        let bytes = snap.to_bytes(3).unwrap();
        assert_eq!(&bytes[0..4], b"TRNS");
        let decoded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snap);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().to_bytes(3).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(CompressError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = sample().to_bytes(3).unwrap();
        bytes[4..8].copy_from_slice(&99u32.to_be_bytes());
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(CompressError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn rejects_tampered_payload() {
        let mut bytes = sample().to_bytes(3).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(CompressError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_truncation() {
        let bytes = sample().to_bytes(3).unwrap();
        assert!(Snapshot::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(matches!(
            Snapshot::from_bytes(&bytes[..6]),
            Err(CompressError::Corrupt(_))
        ));
    }

    /// Re-frame the compressed body of `bytes` under a different declared length.
    fn reframe(bytes: &[u8], raw_len: u64) -> Vec<u8> {
        let body_end = bytes.len() - TRAILER_LEN;
        let (_, consumed) = decode_varint(&bytes[HEADER_LEN..body_end]).unwrap();
        let mut out = bytes[..HEADER_LEN].to_vec();
        encode_varint(&mut out, raw_len);
        out.extend_from_slice(&bytes[HEADER_LEN + consumed..]);
        out
    }

    #[test]
    fn rejects_oversized_declared_length() {
        let bytes = sample().to_bytes(3).unwrap();
        let forged = reframe(&bytes, u64::MAX);
        assert!(matches!(
            Snapshot::from_bytes(&forged),
            Err(CompressError::Corrupt(_))
        ));
        let forged = reframe(&bytes, MAX_PAYLOAD_LEN + 1);
        assert!(matches!(
            Snapshot::from_bytes(&forged),
            Err(CompressError::Corrupt(_))
        ));
    }

    #[test]
    fn rejects_understated_declared_length() {
        let bytes = sample().to_bytes(3).unwrap();
        assert!(Snapshot::from_bytes(&reframe(&bytes, 1)).is_err());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.trns");
        let snap = sample();
        snap.save(&path, 3).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snap);
        assert!(matches!(
            Snapshot::load(dir.path().join("missing.trns")),
            Err(CompressError::Io(_))
        ));
    }
}
