// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Byte/text path codec

use encoding_rs::Encoding;
use pathfs_core::{encoding::default_path_encoding, ErrorKind, FsError, FsResult, OutBuf};
use serde::{Deserialize, Serialize};

/// Codec configuration (JSON/TOML-friendly).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    /// WHATWG label of the path encoding (for example `"utf-8"` or
    /// `"windows-1252"`). `None` selects the environment's reporting
    /// encoding.
    pub encoding: Option<String>,
}

impl CodecConfig {
    pub fn resolve(&self) -> FsResult<&'static Encoding> {
        match &self.encoding {
            None => Ok(default_path_encoding()),
            Some(label) => Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                FsError::with_message(
                    ErrorKind::InvalidArgument,
                    format!("unknown encoding label {label:?}"),
                )
            }),
        }
    }
}

/// Converts between native byte buffers and text paths/names.
///
/// Decoding never fails: malformed sequences become replacement characters,
/// since rejecting a path the kernel handed over is not the filesystem
/// implementation's call to make. Encoding substitutes printable numeric
/// references for unmappable characters and reports `OutOfRange` when the
/// destination runs out of room.
#[derive(Clone, Copy, Debug)]
pub struct PathCodec {
    encoding: &'static Encoding,
}

impl PathCodec {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    pub fn from_config(config: &CodecConfig) -> FsResult<Self> {
        Ok(Self::new(config.resolve()?))
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _) = self.encoding.decode_without_bom_handling(bytes);
        text.into_owned()
    }

    /// Encode `text` into `dst` without a terminator.
    pub fn encode(&self, text: &str, dst: &mut OutBuf<'_>) -> FsResult<()> {
        let (bytes, _, _) = self.encoding.encode(text);
        dst.put(&bytes)
    }

    /// Encode `text` into a fresh buffer.
    pub fn encode_vec(&self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes.into_owned()
    }

    /// Exact encoded byte length of `text`, replacements included.
    pub fn encoded_len(&self, text: &str) -> usize {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_round_trip() {
        let codec = PathCodec::new(encoding_rs::UTF_8);
        let path = "/data/ž/čtení.txt";
        assert_eq!(codec.decode(&codec.encode_vec(path)), path);
    }

    #[test]
    fn malformed_input_decodes_with_replacement() {
        let codec = PathCodec::new(encoding_rs::UTF_8);
        let decoded = codec.decode(b"/a\xff\xfeb");
        assert!(decoded.starts_with("/a"));
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn unmappable_characters_become_printable_substitutes() {
        let codec = PathCodec::new(encoding_rs::WINDOWS_1252);
        let bytes = codec.encode_vec("日本"); // no windows-1252 mapping
        assert_eq!(bytes, b"&#26085;&#26412;");
        assert_eq!(codec.encoded_len("日本"), bytes.len());
    }

    #[test]
    fn encode_reports_out_of_space() {
        let codec = PathCodec::new(encoding_rs::UTF_8);
        let mut raw = [0u8; 3];
        let mut dst = OutBuf::new(&mut raw);
        let err = codec.encode("long-target", &mut dst).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn config_resolves_labels() {
        let config: CodecConfig = serde_json::from_str(r#"{"encoding":"windows-1252"}"#).unwrap();
        assert_eq!(config.resolve().unwrap(), encoding_rs::WINDOWS_1252);

        let config: CodecConfig = serde_json::from_str(r#"{"encoding":"no-such-label"}"#).unwrap();
        assert_eq!(
            config.resolve().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        let config = CodecConfig::default();
        assert!(config.resolve().is_ok());
    }
}
