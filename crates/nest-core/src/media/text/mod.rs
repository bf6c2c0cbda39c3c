//! Zero-width marker carrier for plain text.
//!
//! Every word is one unit: a zero width space (U+200B) right after the word is a `1`,
//! no marker is a `0`. A missing marker looks exactly like "nothing hidden here",
//! so extraction is positional and needs the length from the container header.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::error;

use crate::capacity;
use crate::error::NestError;
use crate::media::{
    hide_data, persist_atomically, unveil_data, Carrier, HideBit, Persist, Units, UnveilBit,
};
use crate::result::Result;
use crate::StegoKey;

pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCarrier {
    text: String,
}

impl TextCarrier {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }

    pub fn open(file: &Path) -> Result<Self> {
        let bytes = fs::read(file).map_err(|e| NestError::ReadError { source: e })?;
        let text = String::from_utf8(bytes).map_err(|e| {
            error!("Text carrier {file:?} is not valid UTF-8: {e}");
            NestError::InvalidTextMedia
        })?;

        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn capacity_bits(&self) -> usize {
        capacity::text_bits(Words::parse(&self.text).unit_count())
    }
}

impl Carrier for TextCarrier {
    fn capacity(&self, _key: &StegoKey) -> usize {
        self.capacity_bits()
    }

    fn embed(&mut self, data: &[u8], key: &StegoKey) -> Result<()> {
        let mut words = Words::parse(&self.text);
        let capacity = capacity::text_bits(words.unit_count());
        capacity::ensure_fits(data.len(), capacity)?;

        words.strip_markers();
        hide_data(&mut words, capacity, data, key)?;
        self.text = words.join();

        Ok(())
    }

    fn extract(&self, key: &StegoKey, len: usize) -> Result<Vec<u8>> {
        let words = Words::parse(&self.text);
        let capacity = capacity::text_bits(words.unit_count());
        unveil_data(&words, capacity, len, key)
    }
}

impl Persist for TextCarrier {
    fn save_as(&mut self, file: &Path) -> Result<()> {
        persist_atomically(file, |f| Ok(f.write_all(self.text.as_bytes())?))
    }
}

/// Space separated tokens, units are the tokens that still hold a word without markers.
struct Words {
    tokens: Vec<String>,
    slots: Vec<usize>,
}

impl Words {
    fn parse(text: &str) -> Self {
        let tokens: Vec<String> = text.split(' ').map(str::to_string).collect();
        let slots = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.chars().any(|c| c != ZERO_WIDTH_SPACE))
            .map(|(i, _)| i)
            .collect();

        Self { tokens, slots }
    }

    fn strip_markers(&mut self) {
        for token in &mut self.tokens {
            token.retain(|c| c != ZERO_WIDTH_SPACE);
        }
    }

    fn join(&self) -> String {
        self.tokens.join(" ")
    }
}

impl Units for Words {
    fn unit_count(&self) -> usize {
        self.slots.len()
    }
}

impl HideBit for Words {
    fn hide_bit(&mut self, unit: usize, bit: bool) {
        let token = &mut self.tokens[self.slots[unit]];
        token.retain(|c| c != ZERO_WIDTH_SPACE);
        if bit {
            token.push(ZERO_WIDTH_SPACE);
        }
    }
}

impl UnveilBit for Words {
    fn unveil_bit(&self, unit: usize) -> bool {
        self.tokens[self.slots[unit]].contains(ZERO_WIDTH_SPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lorem(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn should_unveil_what_was_hidden() {
        let key = StegoKey::from_passphrase("SuperSecret42");
        let mut carrier = TextCarrier::new(lorem(200));
        carrier.embed(b"Hi there", &key).unwrap();

        assert_eq!(carrier.extract(&key, 8).unwrap(), b"Hi there");
    }

    #[test]
    fn visible_text_is_unchanged() {
        let key = StegoKey::from([6u8; 32]);
        let cover = lorem(100);
        let mut carrier = TextCarrier::new(cover.clone());
        carrier.embed(&[0xFF; 4], &key).unwrap();

        let visible: String = carrier
            .as_str()
            .chars()
            .filter(|c| *c != ZERO_WIDTH_SPACE)
            .collect();
        assert_eq!(visible, cover);
        assert_eq!(
            carrier
                .as_str()
                .chars()
                .filter(|c| *c == ZERO_WIDTH_SPACE)
                .count(),
            32
        );
    }

    #[test]
    fn existing_markers_are_stripped_first() {
        let key = StegoKey::from([7u8; 32]);
        let marked = lorem(64).replace(' ', "\u{200B} ");
        let mut carrier = TextCarrier::new(marked);
        carrier.embed(&[0x00], &key).unwrap();

        assert!(!carrier.as_str().contains(ZERO_WIDTH_SPACE));
        assert_eq!(carrier.extract(&key, 1).unwrap(), vec![0x00]);
    }

    #[test]
    fn capacity_counts_words_only() {
        let carrier = TextCarrier::new("  one two\u{200B}  three \u{200B} ");

        assert_eq!(carrier.capacity_bits(), 3);
    }

    #[test]
    fn too_long_payloads_leave_the_text_untouched() {
        let key = StegoKey::from([1u8; 32]);
        let cover = format!("{} \u{200B}", lorem(15));
        let mut carrier = TextCarrier::new(cover.clone());

        assert!(matches!(
            carrier.embed(&[1, 2], &key),
            Err(NestError::CapacityExceeded {
                required: 16,
                capacity: 15
            })
        ));
        assert_eq!(carrier.as_str(), cover);
    }
}
