//! This module defines the canonical representation of a comparable item and the
//! text encodings used to turn textual items into the byte sequences that the
//! compression oracle consumes.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NcdError;

/// The declared encoding for text items.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// **Default:** text is used as its UTF-8 bytes. Never fails.
    #[default]
    Utf8,
    /// 7-bit ASCII. Any character above U+007F is an encoding error.
    Ascii,
    /// ISO-8859-1. Any character above U+00FF is an encoding error.
    Latin1,
}

impl TextEncoding {
    /// Encodes `text` into bytes, borrowing whenever the UTF-8 bytes are already valid output.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, NcdError> {
        match self {
            TextEncoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            TextEncoding::Ascii => {
                if let Some((index, character)) = text.char_indices().find(|(_, c)| !c.is_ascii())
                {
                    return Err(NcdError::Encoding {
                        encoding: *self,
                        index,
                        character,
                    });
                }
                Ok(Cow::Borrowed(text.as_bytes()))
            }
            TextEncoding::Latin1 => {
                // ASCII text is byte-identical in Latin-1, so only re-encode when needed.
                if text.is_ascii() {
                    return Ok(Cow::Borrowed(text.as_bytes()));
                }
                let mut out = Vec::with_capacity(text.len());
                for (index, character) in text.char_indices() {
                    let code = u32::from(character);
                    if code > 0xFF {
                        return Err(NcdError::Encoding {
                            encoding: *self,
                            index,
                            character,
                        });
                    }
                    out.push(code as u8);
                }
                Ok(Cow::Owned(out))
            }
        }
    }

    /// Decodes raw bytes read from a source into text.
    ///
    /// An invalid byte is reported as [`NcdError::Encoding`] with its offset; the
    /// offending byte is shown as its Latin-1 character.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, NcdError> {
        let invalid_at = |index: usize| NcdError::Encoding {
            encoding: *self,
            index,
            character: char::from(bytes[index]),
        };
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| invalid_at(e.valid_up_to())),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(index) => Err(invalid_at(index)),
                None => std::str::from_utf8(bytes)
                    .map(Cow::Borrowed)
                    .map_err(|e| invalid_at(e.valid_up_to())),
            },
            TextEncoding::Latin1 => {
                if bytes.is_ascii() {
                    return std::str::from_utf8(bytes)
                        .map(Cow::Borrowed)
                        .map_err(|e| invalid_at(e.valid_up_to()));
                }
                Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin1",
        };
        f.write_str(name)
    }
}

impl FromStr for TextEncoding {
    type Err = NcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(NcdError::Configuration(format!(
                "Invalid encoding '{}'. Must be 'utf8', 'ascii', or 'latin1'.",
                other
            ))),
        }
    }
}

/// An opaque unit of comparison.
///
/// Items are immutable once handed to the core. Text items are converted to bytes
/// with the configured [`TextEncoding`]; byte items are used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Bytes(Vec<u8>),
    Text(String),
}

impl Item {
    /// Returns the byte sequence this item contributes to a compression.
    pub fn encode(&self, encoding: TextEncoding) -> Result<Cow<'_, [u8]>, NcdError> {
        match self {
            Item::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            Item::Text(text) => encoding.encode(text),
        }
    }

    /// Raw length before encoding: bytes for `Bytes`, UTF-8 bytes for `Text`.
    pub fn len(&self) -> usize {
        match self {
            Item::Bytes(bytes) => bytes.len(),
            Item::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Item::Text(value.to_string())
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Item::Text(value)
    }
}

impl From<Vec<u8>> for Item {
    fn from(value: Vec<u8>) -> Self {
        Item::Bytes(value)
    }
}

impl From<&[u8]> for Item {
    fn from(value: &[u8]) -> Self {
        Item::Bytes(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_borrows_input() {
        let item = Item::from("héllo");
        let bytes = item.encode(TextEncoding::Utf8).unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, "héllo".as_bytes());
    }

    #[test]
    fn test_ascii_rejects_non_ascii_with_position() {
        let err = TextEncoding::Ascii.encode("abc€").unwrap_err();
        match err {
            NcdError::Encoding {
                encoding,
                index,
                character,
            } => {
                assert_eq!(encoding, TextEncoding::Ascii);
                assert_eq!(index, 3);
                assert_eq!(character, '€');
            }
            other => panic!("expected an encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_latin1_maps_high_code_points_to_single_bytes() {
        let bytes = TextEncoding::Latin1.encode("é").unwrap();
        assert_eq!(&*bytes, &[0xE9]);
        assert!(TextEncoding::Latin1.encode("漢").is_err());
    }

    #[test]
    fn test_bytes_item_ignores_encoding() {
        let item = Item::from(vec![0xFFu8, 0x00]);
        let bytes = item.encode(TextEncoding::Ascii).unwrap();
        assert_eq!(&*bytes, &[0xFF, 0x00]);
    }

    #[test]
    fn test_decode_rejects_invalid_utf8_at_its_offset() {
        let err = TextEncoding::Utf8.decode(b"caf\xe9 broken").unwrap_err();
        assert!(
            matches!(err, NcdError::Encoding { index: 3, character: '\u{e9}', .. }),
            "got {:?}",
            err
        );
        assert!(TextEncoding::Ascii.decode(b"caf\xe9").is_err());
    }

    #[test]
    fn test_latin1_decode_round_trips_high_bytes() {
        let text = TextEncoding::Latin1.decode(b"caf\xe9").unwrap();
        assert_eq!(text, "café");
        assert_eq!(&*TextEncoding::Latin1.encode(&text).unwrap(), b"caf\xe9");
        assert!(matches!(
            TextEncoding::Latin1.decode(b"plain").unwrap(),
            Cow::Borrowed("plain")
        ));
    }

    #[test]
    fn test_encoding_parses_case_insensitively() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("Latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!(matches!(
            "ebcdic".parse::<TextEncoding>(),
            Err(NcdError::Configuration(_))
        ));
    }
}
