//! File decoding for the supported formats

use super::{container, resample_to_target, AudioFormat, Decoder, SampleStream, DEFAULT_SAMPLE_RATE};
use crate::Error;
use anyhow::Context;
use std::path::Path;

/// Interleaved PCM straight out of a format decoder
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Downmix to mono by averaging channels
    pub fn into_mono(self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples;
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }
}

/// Decodes audio files into mono streams at a fixed rate
#[derive(Debug, Clone)]
pub struct FileDecoder {
    target_sample_rate: u32,
}

impl FileDecoder {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    fn decode_to_mono(&self, path: &Path) -> anyhow::Result<Vec<f32>> {
        if !path.exists() {
            anyhow::bail!("file not found");
        }

        let format = AudioFormat::from_path(path);
        let decoded = match format {
            AudioFormat::Wav => decode_wav(path)?,
            AudioFormat::Mp3 => decode_mp3(path)?,
            AudioFormat::Flac => decode_flac(path)?,
            AudioFormat::Ogg => decode_ogg(path)?,
            f if f.is_container() => container::decode_container(path)?,
            _ => anyhow::bail!("unsupported audio format"),
        };

        if decoded.sample_rate == 0 {
            anyhow::bail!("stream reports a sample rate of 0");
        }

        let source_rate = decoded.sample_rate;
        log::debug!(
            "Decoded {}: {} interleaved samples, {} channel(s) @ {}Hz",
            path.display(),
            decoded.samples.len(),
            decoded.channels,
            source_rate
        );

        let mono = decoded.into_mono();
        resample_to_target(&mono, source_rate, self.target_sample_rate)
    }
}

impl Default for FileDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Decoder for FileDecoder {
    fn decode(&self, path: &Path) -> crate::Result<SampleStream> {
        let samples = self.decode_to_mono(path).map_err(|e| Error::Decode {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        })?;
        Ok(SampleStream::new(samples, self.target_sample_rate))
    }
}

fn decode_wav(path: &Path) -> anyhow::Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(path).context("failed to open WAV file")?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn decode_mp3(path: &Path) -> anyhow::Result<DecodedAudio> {
    let data = std::fs::read(path).context("failed to read MP3 file")?;

    let mut decoder = minimp3::Decoder::new(&data[..]);
    let mut samples = Vec::new();
    let mut sample_rate = 0;
    let mut channels = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                samples.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => anyhow::bail!("MP3 decode error: {}", e),
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

fn decode_flac(path: &Path) -> anyhow::Result<DecodedAudio> {
    let mut reader = claxon::FlacReader::open(path).context("failed to open FLAC file")?;

    let info = reader.streaminfo();
    let max_val = (1i64 << (info.bits_per_sample - 1)) as f32;
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedAudio {
        samples,
        sample_rate: info.sample_rate,
        channels: info.channels as u16,
    })
}

fn decode_ogg(path: &Path) -> anyhow::Result<DecodedAudio> {
    let file = std::fs::File::open(path).context("failed to open OGG file")?;
    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;

    let mut samples = Vec::new();
    while let Some(packet) = reader.read_dec_packet_itl()? {
        samples.extend(packet.iter().map(|&s| s as f32 / 32768.0));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        let audio = DecodedAudio {
            samples: vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0],
            sample_rate: 8000,
            channels: 2,
        };
        assert_eq!(audio.into_mono(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let decoder = FileDecoder::default();
        match decoder.decode(Path::new("/nonexistent/set.wav")) {
            Err(Error::Decode { path, .. }) => assert_eq!(path, Path::new("/nonexistent/set.wav")),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_wav_decode_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..22_050 {
            let v = ((i as f32 * 0.05).sin() * 10_000.0) as i16;
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let stream = FileDecoder::new(22_050).decode(&path).unwrap();
        assert_eq!(stream.sample_rate(), 22_050);
        assert_eq!(stream.len(), 22_050);
    }
}
