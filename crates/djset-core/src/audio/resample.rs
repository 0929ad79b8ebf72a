//! Sample-rate conversion with rubato's FFT resampler

use anyhow::Result;
use rubato::{FftFixedIn, Resampler};

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample mono audio from `from_rate` to `to_rate`.
///
/// The output is trimmed for resampler delay so that it stays time-aligned
/// with the input and has `ceil(len * to / from)` samples.
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let expected_len =
        (samples.len() as f64 * to_rate as f64 / from_rate as f64).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        1,
    )?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_FRAMES);
    let mut pos = 0;

    while samples.len() - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let chunk = [&samples[pos..pos + n]];
        let out = resampler.process(&chunk, None)?;
        output.extend_from_slice(&out[0]);
        pos += n;
    }

    if pos < samples.len() {
        let tail = [&samples[pos..]];
        let out = resampler.process_partial(Some(&tail), None)?;
        output.extend_from_slice(&out[0]);
    }

    // Flush until the delayed tail has been emitted
    while output.len() < expected_len + delay {
        let out = resampler.process_partial::<&[f32]>(None, None)?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    let mut aligned: Vec<f32> = output.into_iter().skip(delay).collect();
    aligned.resize(expected_len, 0.0);

    log::trace!(
        "Resampled {} -> {} samples ({}Hz -> {}Hz, delay {})",
        samples.len(),
        aligned.len(),
        from_rate,
        to_rate,
        delay
    );

    Ok(aligned)
}
