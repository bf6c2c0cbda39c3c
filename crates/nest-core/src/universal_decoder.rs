use std::io::{Read, Result};

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::media::UnveilBit;
use crate::positions::Positions;
use crate::StegoKey;

/// Reads back what [`Encoder`](crate::universal_encoder::Encoder) has written with the same key.
pub struct Decoder<'u, 'k, U: UnveilBit + ?Sized> {
    units: &'u U,
    positions: Positions<'k>,
}

impl<'u, 'k, U: UnveilBit + ?Sized> Decoder<'u, 'k, U> {
    pub fn new(units: &'u U, key: &'k StegoKey) -> Self {
        let positions = Positions::new(key, units.unit_count());
        Self { units, positions }
    }
}

impl<U: UnveilBit + ?Sized> Read for Decoder<'_, '_, U> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut bits = BitWriter::endian(Vec::with_capacity(buf.len()), BigEndian);
        'bytes: for _ in 0..buf.len() {
            for _ in 0..8 {
                let Some(unit) = self.positions.next() else {
                    break 'bytes;
                };
                bits.write_bit(self.units.unveil_bit(unit))?;
            }
        }
        // an incomplete trailing byte is dropped
        let bytes = bits.into_writer();
        buf[..bytes.len()].copy_from_slice(&bytes);

        Ok(bytes.len())
    }
}
