use ffmpeg_types::{AudioFrame, SampleFormat};

/// The output device is always fed signed 16-bit interleaved samples
pub const OUTPUT_BYTES_PER_SAMPLE: usize = 2;

/**
    Normalize an interleaved frame of any sample format to native-endian
    signed 16-bit samples, the only format handed to the output device.

    Bytes past the frame's sample count, or not forming a whole sample,
    are ignored.
*/
pub fn to_s16_interleaved(frame: &AudioFrame) -> Vec<u8> {
    let data = &frame.data[..frame.expected_data_len().min(frame.data.len())];
    match frame.format {
        SampleFormat::S16 => {
            let whole = data.len() - data.len() % 2;
            data[..whole].to_vec()
        }
        SampleFormat::U8 => collect(data.iter().map(|&b| (b as i16 - 128) << 8)),
        SampleFormat::S32 => collect(
            data.chunks_exact(4)
                .map(|c| (i32::from_ne_bytes([c[0], c[1], c[2], c[3]]) >> 16) as i16),
        ),
        SampleFormat::F32 => collect(
            data.chunks_exact(4)
                .map(|c| float_to_s16(f32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f64)),
        ),
        SampleFormat::F64 => collect(data.chunks_exact(8).map(|c| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(c);
            float_to_s16(f64::from_ne_bytes(bytes))
        })),
    }
}

fn float_to_s16(value: f64) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
}

fn collect(samples: impl Iterator<Item = i16>) -> Vec<u8> {
    samples.flat_map(i16::to_ne_bytes).collect()
}
