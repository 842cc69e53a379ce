//! Payload packing modes and the gzip codec.
//!
//! | Mode                       | Payload          | Declared size        | Decompress on read |
//! |----------------------------|------------------|----------------------|--------------------|
//! | [`PackMode::Development`]  | raw bytes        | on-disk length       | no                 |
//! | [`PackMode::Production`]   | gzip             | compressed length    | yes                |
//! | [`PackMode::ProductionNoDecompress`] | gzip   | compressed length    | no                 |
//! | [`PackMode::Linked`]       | none (disk read) | on-disk length       | no                 |

use crate::error::{EmbedError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// How file payloads are stored in an artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackMode {
    /// Raw bytes.
    #[default]
    Development,
    /// Gzip, inflated on read.
    Production,
    /// Gzip, served compressed.
    ProductionNoDecompress,
    /// No payload; read from the original location at runtime.
    Linked,
}

impl PackMode {
    /// Short name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Production => "prod",
            Self::ProductionNoDecompress => "prod-raw",
            Self::Linked => "linked",
        }
    }

    /// Whether payloads are gzip-compressed.
    #[must_use]
    pub const fn compresses(self) -> bool {
        matches!(self, Self::Production | Self::ProductionNoDecompress)
    }

    /// Whether readers inflate payloads.
    #[must_use]
    pub const fn decompresses(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether payloads are embedded at all.
    #[must_use]
    pub const fn embeds_payload(self) -> bool {
        !matches!(self, Self::Linked)
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Development => 0,
            Self::Production => 1,
            Self::ProductionNoDecompress => 2,
            Self::Linked => 3,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Production,
            2 => Self::ProductionNoDecompress,
            3 => Self::Linked,
            _ => Self::Development,
        }
    }
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackMode {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            "prod-raw" | "production-no-decompress" => Ok(Self::ProductionNoDecompress),
            "linked" => Ok(Self::Linked),
            other => Err(EmbedError::InvalidConfig {
                reason: format!("unknown pack mode '{other}' (expected dev, prod, prod-raw, linked)"),
            }),
        }
    }
}

/// Gzip-compresses a buffer.
///
/// # Errors
///
/// Returns an I/O error if the encoder fails.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflates a gzip buffer.
///
/// # Errors
///
/// Returns an I/O error if the input is not valid gzip.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Returns the stored payload, inflated when `decompress` is set.
///
/// # Errors
///
/// Returns an I/O error if inflation fails.
pub fn unpack(payload: &[u8], decompress: bool) -> io::Result<Vec<u8>> {
    if decompress {
        self::decompress(payload)
    } else {
        Ok(payload.to_vec())
    }
}

/// Stored form of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPayload {
    /// Bytes to embed, `None` in linked mode
    pub payload: Option<Vec<u8>>,
    /// Size reported before the first read
    pub declared_size: u64,
    /// Whether readers inflate the payload
    pub decompress: bool,
}

/// Packs an in-memory buffer.
///
/// # Errors
///
/// Returns an I/O error if compression fails.
pub fn pack_bytes(data: &[u8], mode: PackMode) -> io::Result<PackedPayload> {
    let packed = match mode {
        PackMode::Development => PackedPayload {
            payload: Some(data.to_vec()),
            declared_size: data.len() as u64,
            decompress: false,
        },
        PackMode::Production | PackMode::ProductionNoDecompress => {
            let compressed = compress(data)?;
            PackedPayload {
                declared_size: compressed.len() as u64,
                payload: Some(compressed),
                decompress: mode.decompresses(),
            }
        }
        PackMode::Linked => PackedPayload {
            payload: None,
            declared_size: data.len() as u64,
            decompress: false,
        },
    };
    Ok(packed)
}

/// Packs a file from disk, streaming it through the encoder.
///
/// # Errors
///
/// Returns [`EmbedError::PackFailure`] if the file cannot be opened or read
/// or compression fails.
pub fn pack_file(path: &Path, mode: PackMode) -> Result<PackedPayload> {
    let failure = |source: io::Error| EmbedError::PackFailure {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(failure)?;
    match mode {
        PackMode::Development => {
            let mut data = Vec::new();
            file.read_to_end(&mut data).map_err(failure)?;
            pack_bytes(&data, mode).map_err(failure)
        }
        PackMode::Production | PackMode::ProductionNoDecompress => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            io::copy(&mut file, &mut encoder).map_err(failure)?;
            let compressed = encoder.finish().map_err(failure)?;
            Ok(PackedPayload {
                declared_size: compressed.len() as u64,
                payload: Some(compressed),
                decompress: mode.decompresses(),
            })
        }
        PackMode::Linked => {
            let size = file.metadata().map_err(failure)?.len();
            Ok(PackedPayload {
                payload: None,
                declared_size: size,
                decompress: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gzip_round_trip_edge_inputs() {
        let inputs: [&[u8]; 4] = [b"", b"hello", &[0u8; 4096], &[0xEF, 0xBB, 0xBF, b'`']];
        for input in inputs {
            let compressed = compress(input).unwrap();
            assert_eq!(decompress(&compressed).unwrap(), input);
        }
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        assert!(decompress(b"plain text").is_err());
    }

    #[test]
    fn test_production_declares_compressed_length() {
        let packed = pack_bytes(b"hello", PackMode::Production).unwrap();
        let payload = packed.payload.unwrap();
        assert_eq!(packed.declared_size, payload.len() as u64);
        assert!(packed.decompress);
        assert_eq!(unpack(&payload, true).unwrap(), b"hello");
    }

    #[test]
    fn test_no_decompress_keeps_gzip() {
        let packed = pack_bytes(b"hello", PackMode::ProductionNoDecompress).unwrap();
        assert!(!packed.decompress);
        let payload = packed.payload.unwrap();
        assert_eq!(&payload[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_development_is_raw() {
        let packed = pack_bytes(b"hello", PackMode::Development).unwrap();
        assert_eq!(packed.payload.as_deref(), Some(&b"hello"[..]));
        assert_eq!(packed.declared_size, 5);
    }

    #[test]
    fn test_pack_file_modes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, b"some text").unwrap();

        let dev = pack_file(&path, PackMode::Development).unwrap();
        assert_eq!(dev.payload.as_deref(), Some(&b"some text"[..]));

        let prod = pack_file(&path, PackMode::Production).unwrap();
        assert_eq!(decompress(prod.payload.as_ref().unwrap()).unwrap(), b"some text");

        let linked = pack_file(&path, PackMode::Linked).unwrap();
        assert!(linked.payload.is_none());
        assert_eq!(linked.declared_size, 9);
    }

    #[test]
    fn test_pack_missing_file_is_pack_failure() {
        let temp = TempDir::new().unwrap();
        let err = pack_file(&temp.path().join("gone"), PackMode::Production).unwrap_err();
        assert!(err.is_pack_failure());
    }

    #[test]
    fn test_mode_parse_and_display() {
        for mode in [
            PackMode::Development,
            PackMode::Production,
            PackMode::ProductionNoDecompress,
            PackMode::Linked,
        ] {
            assert_eq!(mode.as_str().parse::<PackMode>().unwrap(), mode);
            assert_eq!(PackMode::from_u8(mode.to_u8()), mode);
        }
        assert!("zip".parse::<PackMode>().is_err());
    }
}
