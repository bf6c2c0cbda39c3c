use std::io::{Cursor, Result, Write};

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::media::HideBit;
use crate::positions::Positions;
use crate::StegoKey;

/// Writes bytes, most significant bit first, onto the units picked by the position generator.
///
/// Returns fewer bytes than offered once the carrier runs out of units.
pub struct Encoder<'u, 'k, U: HideBit + ?Sized> {
    units: &'u mut U,
    positions: Positions<'k>,
}

impl<'u, 'k, U: HideBit + ?Sized> Encoder<'u, 'k, U> {
    pub fn new(units: &'u mut U, key: &'k StegoKey) -> Self {
        let positions = Positions::new(key, units.unit_count());
        Self { units, positions }
    }
}

impl<U: HideBit + ?Sized> Write for Encoder<'_, '_, U> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut bits = BitReader::endian(Cursor::new(buf), BigEndian);
        let mut written = 0;
        for _ in 0..buf.len() {
            for _ in 0..8 {
                let bit = bits.read_bit()?;
                let Some(unit) = self.positions.next() else {
                    return Ok(written);
                };
                self.units.hide_bit(unit, bit);
            }
            written += 1;
        }

        Ok(written)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
