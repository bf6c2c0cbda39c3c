/// A carrier seen as a flat array of addressable units, each holding one hidden bit
pub trait Units {
    fn unit_count(&self) -> usize;
}

/// write access to the hidden bit of a unit
pub trait HideBit: Units {
    fn hide_bit(&mut self, unit: usize, bit: bool);
}

/// read access to the hidden bit of a unit
pub trait UnveilBit: Units {
    fn unveil_bit(&self, unit: usize) -> bool;
}

/// Color channel bytes, one unit per byte in its least significant bit
impl Units for [u8] {
    fn unit_count(&self) -> usize {
        self.len()
    }
}

impl HideBit for [u8] {
    fn hide_bit(&mut self, unit: usize, bit: bool) {
        let c = &mut self[unit];
        *c = (*c & !1) | bit as u8;
    }
}

impl UnveilBit for [u8] {
    fn unveil_bit(&self, unit: usize) -> bool {
        self[unit] & 1 == 1
    }
}

/// 16 bit audio samples, each offering its lowest `depth` bits as units.
///
/// Unit `u` is bit plane `u % depth` of sample `u / depth`.
pub struct SampleBits<S> {
    samples: S,
    depth: usize,
}

impl<S> SampleBits<S> {
    pub fn new(samples: S, depth: u8) -> Self {
        Self {
            samples,
            depth: depth.max(1) as usize,
        }
    }

    fn locate(&self, unit: usize) -> (usize, usize) {
        (unit / self.depth, unit % self.depth)
    }
}

impl<S: AsRef<[i16]>> Units for SampleBits<S> {
    fn unit_count(&self) -> usize {
        self.samples.as_ref().len() * self.depth
    }
}

impl<S: AsRef<[i16]> + AsMut<[i16]>> HideBit for SampleBits<S> {
    fn hide_bit(&mut self, unit: usize, bit: bool) {
        let (sample, plane) = self.locate(unit);
        let s = &mut self.samples.as_mut()[sample];
        *s = (*s & !(1 << plane)) | ((bit as i16) << plane);
    }
}

impl<S: AsRef<[i16]>> UnveilBit for SampleBits<S> {
    fn unveil_bit(&self, unit: usize) -> bool {
        let (sample, plane) = self.locate(unit);
        (self.samples.as_ref()[sample] >> plane) & 1 == 1
    }
}
