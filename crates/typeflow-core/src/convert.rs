//! UTF-16 text handling
//!
//! The engine addresses text by UTF-16 code unit: clusters, line ranges, and
//! break positions are all UTF-16 offsets. The Unicode crates the shaper
//! leans on (bidi, scripts, line breaking) are byte-indexed over UTF-8, so
//! [`Utf16Text`] keeps both encodings of the paragraph plus index maps in
//! each direction. The maps are built once per `get_glyphs` call and shared
//! by every itemization pass.

/// Encode a UTF-8 string as UTF-16 code units.
pub fn utf8_to_utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Decode UTF-16 code units into a UTF-8 string, replacing unpaired
/// surrogates with U+FFFD.
pub fn utf16_to_utf8(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode UTF-32 code points into a UTF-8 string, replacing invalid scalar
/// values with U+FFFD.
pub fn utf32_to_utf8(code_points: &[u32]) -> String {
    code_points
        .iter()
        .map(|&cp| char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// A paragraph of UTF-16 text with a UTF-8 mirror and index maps
///
/// Unpaired surrogates decode as U+FFFD. The replacement character occupies
/// one UTF-16 unit, same as the surrogate it stands for, so cluster indices
/// into the original units stay aligned with the decoded text.
#[derive(Debug, Clone)]
pub struct Utf16Text {
    units: Vec<u16>,
    utf8: String,
    /// UTF-16 offset of the character containing each UTF-8 byte;
    /// one extra entry for the end position.
    utf16_of_byte: Vec<u32>,
    /// UTF-8 byte offset of the character containing each UTF-16 unit;
    /// one extra entry for the end position.
    byte_of_utf16: Vec<u32>,
}

impl Utf16Text {
    pub fn from_units(units: &[u16]) -> Self {
        let mut utf8 = String::with_capacity(units.len());
        let mut utf16_of_byte = Vec::with_capacity(units.len());
        let mut byte_of_utf16 = Vec::with_capacity(units.len());
        let mut utf16_pos: u32 = 0;

        for item in char::decode_utf16(units.iter().copied()) {
            let (c, len16) = match item {
                Ok(c) => (c, c.len_utf16()),
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            let byte = utf8.len() as u32;
            for _ in 0..len16 {
                byte_of_utf16.push(byte);
            }
            for _ in 0..c.len_utf8() {
                utf16_of_byte.push(utf16_pos);
            }
            utf8.push(c);
            utf16_pos += len16 as u32;
        }

        utf16_of_byte.push(utf16_pos);
        byte_of_utf16.push(utf8.len() as u32);

        Self {
            units: units.to_vec(),
            utf8,
            utf16_of_byte,
            byte_of_utf16,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self::from_units(&utf8_to_utf16(text))
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn utf8(&self) -> &str {
        &self.utf8
    }

    /// Number of UTF-16 code units.
    pub fn len(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Source code unit at a cluster position.
    pub fn unit(&self, utf16_index: u32) -> u16 {
        self.units[utf16_index as usize]
    }

    /// UTF-16 offset of the character containing the given UTF-8 byte.
    pub fn utf16_index(&self, byte: usize) -> u32 {
        self.utf16_of_byte[byte]
    }

    /// UTF-8 byte offset of the character containing the given UTF-16 unit.
    pub fn byte_index(&self, utf16_index: u32) -> usize {
        self.byte_of_utf16[utf16_index as usize] as usize
    }

    /// Decoded characters with their starting UTF-16 offsets.
    pub fn chars(&self) -> impl Iterator<Item = (u32, char)> + '_ {
        self.utf8
            .char_indices()
            .map(|(byte, c)| (self.utf16_of_byte[byte], c))
    }

    /// Decoded characters of the UTF-16 range `[start, end)` with their
    /// starting UTF-16 offsets. Both bounds must sit on character
    /// boundaries, which holds for every run and line range the engine
    /// produces.
    pub fn chars_range(&self, start: u32, end: u32) -> impl Iterator<Item = (u32, char)> + '_ {
        let from = self.byte_index(start);
        let to = self.byte_index(end);
        self.utf8[from..to]
            .char_indices()
            .map(move |(byte, c)| (self.utf16_of_byte[from + byte], c))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // utf8 -> utf16 -> utf8 is the identity on well-formed input.
        #[test]
        fn utf8_utf16_round_trip(s in "\\PC*") {
            let units = utf8_to_utf16(&s);
            prop_assert_eq!(utf16_to_utf8(&units), s);
        }
    }

    proptest! {
        // The index maps are mutually consistent at every character start.
        #[test]
        fn index_maps_agree(s in "\\PC{0,64}") {
            let text = Utf16Text::from_str(&s);
            for (utf16_start, c) in text.chars() {
                let byte = text.byte_index(utf16_start);
                prop_assert_eq!(text.utf16_index(byte), utf16_start);
                prop_assert!(s[byte..].starts_with(c));
            }
        }
    }

    proptest! {
        // Unit count always matches the encoded length.
        #[test]
        fn unit_count_matches_encoding(s in "\\PC{0,64}") {
            let text = Utf16Text::from_str(&s);
            prop_assert_eq!(text.len() as usize, s.encode_utf16().count());
        }
    }
}
