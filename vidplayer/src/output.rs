/*!
    Audio output device driving the engine's fill callback.
*/

use anyhow::{Context, Result, anyhow};
use cpal::{
    BufferSize, SampleRate, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};

use vidsync::AudioEngine;

/**
    An open output stream. Dropping it stops the device.
*/
pub struct AudioOutput {
    _stream: Stream,
}

impl AudioOutput {
    /**
        Open the default output device at the engine's sample rate and
        channel count, requesting `buffer_frames` frames per callback.

        Samples are signed 16-bit interleaved; every callback is served by
        [`AudioEngine::fill`].
    */
    pub fn open(mut engine: AudioEngine, buffer_frames: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no default audio output device"))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let params = engine.params();
        let config = StreamConfig {
            channels: params.channels,
            sample_rate: SampleRate(params.sample_rate),
            buffer_size: BufferSize::Fixed(buffer_frames),
        };

        log::info!(
            "[audio] {device_name}: {} channels, {} Hz, {buffer_frames} frames (~{:.1}ms)",
            config.channels,
            params.sample_rate,
            buffer_frames as f64 / params.sample_rate.max(1) as f64 * 1000.0
        );

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _info: &cpal::OutputCallbackInfo| {
                    engine.fill(bytemuck::cast_slice_mut(data));
                },
                |err| log::error!("[audio] output stream error: {err}"),
                None,
            )
            .with_context(|| format!("failed to build output stream on {device_name}"))?;

        stream
            .play()
            .context("failed to start audio output stream")?;

        Ok(Self { _stream: stream })
    }
}
