use std::io::{Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::error;

use crate::capacity;
use crate::error::NestError;
use crate::media::{
    hide_data, persist_atomically, unveil_data, AudioOptions, Carrier, Persist, SampleBits,
};
use crate::result::Result;
use crate::StegoKey;

/// LSB carrier over the interleaved samples of a 16 bit PCM WAV file
#[derive(Debug, Clone)]
pub struct AudioCarrier {
    spec: WavSpec,
    samples: Vec<i16>,
    lsb_depth: u8,
}

impl AudioCarrier {
    pub fn new(spec: WavSpec, samples: Vec<i16>, options: &AudioOptions) -> Result<Self> {
        if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
            error!(
                "Only 16 bit PCM audio is supported, got {} bit {:?}",
                spec.bits_per_sample, spec.sample_format
            );
            return Err(NestError::InvalidAudioMedia);
        }

        Ok(Self {
            spec,
            samples,
            lsb_depth: options.lsb_depth,
        })
    }

    pub fn open(file: &Path, options: &AudioOptions) -> Result<Self> {
        let mut reader = WavReader::open(file).map_err(|e| {
            error!("Error opening audio {file:?}: {e}");
            NestError::InvalidAudioMedia
        })?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 {
            return Err(NestError::InvalidAudioMedia);
        }
        let samples = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                error!("Error reading samples of {file:?}: {e}");
                NestError::InvalidAudioMedia
            })?;

        Self::new(spec, samples, options)
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn capacity_bits(&self) -> usize {
        capacity::audio_bits(self.samples.len(), self.lsb_depth)
    }

    pub fn write_wav<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut wav_writer =
            WavWriter::new(writer, self.spec).map_err(|_| NestError::AudioEncodingError)?;
        for sample in &self.samples {
            wav_writer
                .write_sample(*sample)
                .map_err(|_| NestError::AudioEncodingError)?;
        }
        wav_writer
            .finalize()
            .map_err(|_| NestError::AudioEncodingError)
    }
}

impl Carrier for AudioCarrier {
    fn capacity(&self, _key: &StegoKey) -> usize {
        self.capacity_bits()
    }

    fn embed(&mut self, data: &[u8], key: &StegoKey) -> Result<()> {
        let capacity = self.capacity_bits();
        let mut units = SampleBits::new(&mut self.samples[..], self.lsb_depth);
        hide_data(&mut units, capacity, data, key)
    }

    fn extract(&self, key: &StegoKey, len: usize) -> Result<Vec<u8>> {
        let units = SampleBits::new(&self.samples[..], self.lsb_depth);
        unveil_data(&units, self.capacity_bits(), len, key)
    }
}

impl Persist for AudioCarrier {
    fn save_as(&mut self, file: &Path) -> Result<()> {
        persist_atomically(file, |f| self.write_wav(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mono_spec() -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    fn sine(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| ((i as f64 / 8.0).sin() * 12_000.0) as i16)
            .collect()
    }

    fn carrier(depth: u8) -> AudioCarrier {
        AudioCarrier::new(mono_spec(), sine(4000), &AudioOptions { lsb_depth: depth }).unwrap()
    }

    #[test]
    fn should_unveil_what_was_hidden_at_every_depth() {
        let key = StegoKey::from_passphrase("SuperSecret42");
        for depth in [1, 2, 4, 8] {
            let mut audio = carrier(depth);
            audio.embed(b"Hello World!", &key).unwrap();

            assert_eq!(audio.extract(&key, 12).unwrap(), b"Hello World!");
        }
    }

    #[test]
    fn samples_only_change_within_their_lsb_depth() {
        let key = StegoKey::from([8u8; 32]);
        let mut audio = carrier(2);
        audio.embed(&[0x5A; 200], &key).unwrap();

        for (before, after) in sine(4000).iter().zip(audio.samples()) {
            assert_eq!(before & !0b11, after & !0b11);
        }
    }

    #[test]
    fn capacity_scales_with_depth() {
        let key = StegoKey::from([0u8; 32]);
        assert_eq!(carrier(1).capacity(&key), 4000);
        assert_eq!(carrier(3).capacity(&key), 12_000);
    }

    #[test]
    fn exceeding_capacity_is_refused() {
        let key = StegoKey::from([0u8; 32]);
        let mut audio = carrier(1);

        assert!(matches!(
            audio.embed(&[1u8; 501], &key),
            Err(NestError::CapacityExceeded {
                required: 4008,
                capacity: 4000
            })
        ));
        assert_eq!(audio.samples(), &sine(4000)[..]);
    }

    #[test]
    fn non_16_bit_audio_is_rejected() {
        let spec = WavSpec {
            bits_per_sample: 24,
            ..mono_spec()
        };
        assert!(matches!(
            AudioCarrier::new(spec, vec![0; 10], &AudioOptions::default()),
            Err(NestError::InvalidAudioMedia)
        ));
    }

    #[test]
    fn saved_wav_keeps_the_payload() {
        let out_dir = TempDir::new().unwrap();
        let target = out_dir.path().join("audio-with-secret.wav");
        let key = StegoKey::from_passphrase("SuperSecret42");
        let mut audio = carrier(1);
        audio.embed(b"Hello World!", &key).unwrap();
        audio.save_as(&target).expect("Cannot save audio");

        let reloaded = AudioCarrier::open(&target, &AudioOptions::default()).unwrap();
        assert_eq!(reloaded.spec(), mono_spec());
        assert_eq!(reloaded.extract(&key, 12).unwrap(), b"Hello World!");
    }
}
