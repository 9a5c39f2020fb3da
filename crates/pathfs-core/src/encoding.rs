// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Default path-encoding selection

use encoding_rs::Encoding;

/// The encoding the environment reports for text, falling back to UTF-8.
///
/// Locale variables carry the codeset after the first `.` (for example
/// `en_US.UTF-8` or `cs_CZ.ISO8859-2@euro`); the first recognizable codeset
/// among `LC_ALL`, `LC_CTYPE` and `LANG` wins.
pub fn default_path_encoding() -> &'static Encoding {
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        let Ok(value) = std::env::var(var) else {
            continue;
        };
        if let Some(enc) = encoding_from_locale(&value) {
            return enc;
        }
    }
    encoding_rs::UTF_8
}

fn encoding_from_locale(value: &str) -> Option<&'static Encoding> {
    let codeset = value.split('.').nth(1)?;
    let label = codeset.split('@').next().unwrap_or(codeset);
    Encoding::for_label(label.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_codesets_resolve_to_encodings() {
        assert_eq!(
            encoding_from_locale("en_US.UTF-8"),
            Some(encoding_rs::UTF_8)
        );
        assert_eq!(
            encoding_from_locale("cs_CZ.ISO8859-2@euro"),
            Some(encoding_rs::ISO_8859_2)
        );
        assert_eq!(encoding_from_locale("C"), None);
        assert_eq!(encoding_from_locale("xx_XX.bogus-charset"), None);
    }
}
