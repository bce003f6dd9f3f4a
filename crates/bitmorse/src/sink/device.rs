use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};

use super::{Pulse, SinkError, ToneSink};
use crate::audio::{PcmQueue, i16_to_f32, resample_linear_mono_f32};
use crate::symbols::BitSymbol;
use crate::tone::{ToneBank, ToneSpec};

type SharedQueue = Arc<Mutex<PcmQueue>>;
type SharedFault = Arc<Mutex<Option<String>>>;

/// Plays pulses on the default output device through cpal.
///
/// The tone bank is synthesized and converted to the device rate once in
/// `open`; every `emit` re-queues one of those cached buffers and blocks
/// until the callback has consumed it.
#[derive(Default)]
pub struct AudioDeviceSink {
    active: Option<ActiveStream>,
}

struct ActiveStream {
    stream: cpal::Stream,
    queue: SharedQueue,
    fault: SharedFault,
    tones: DeviceTones,
    device_rate: u32,
    tail: Duration,
}

/// Tone bank resampled to the device rate.
struct DeviceTones {
    dot: Vec<f32>,
    dash: Vec<f32>,
    gap: Vec<f32>,
}

impl DeviceTones {
    fn new(bank: &ToneBank, device_rate: u32) -> Self {
        let src = bank.sample_rate_hz();
        let convert =
            |p: Pulse| resample_linear_mono_f32(&i16_to_f32(bank.buffer(p)), src, device_rate);
        Self {
            dot: convert(Pulse::Tone(BitSymbol::Dot)),
            dash: convert(Pulse::Tone(BitSymbol::Dash)),
            gap: convert(Pulse::Gap),
        }
    }

    fn buffer(&self, pulse: Pulse) -> &[f32] {
        match pulse {
            Pulse::Tone(BitSymbol::Dot) => &self.dot,
            Pulse::Tone(BitSymbol::Dash) => &self.dash,
            Pulse::Gap => &self.gap,
        }
    }
}

impl AudioDeviceSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the default host exposes an output device.
    #[must_use]
    pub fn is_available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }
}

/// Time the device may still need to play out samples it has already pulled
/// from the queue. Unknown buffer sizes are taken as 50 ms.
fn tail_latency(buffer_size: &cpal::BufferSize, device_rate: u32) -> Duration {
    if device_rate == 0 {
        return Duration::ZERO;
    }
    let frames = match buffer_size {
        cpal::BufferSize::Fixed(frames) => *frames,
        cpal::BufferSize::Default => device_rate / 20,
    };
    Duration::from_nanos(u64::from(frames) * 1_000_000_000 / u64::from(device_rate))
}

fn poisoned() -> SinkError {
    SinkError::Device("pcm queue lock poisoned".to_string())
}

impl ActiveStream {
    fn check_fault(&self) -> Result<(), SinkError> {
        let fault = self.fault.lock().map_err(|_| poisoned())?;
        match fault.as_ref() {
            Some(msg) => Err(SinkError::Device(msg.clone())),
            None => Ok(()),
        }
    }

    fn queued(&self) -> Result<usize, SinkError> {
        Ok(self.queue.lock().map_err(|_| poisoned())?.len())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    queue: SharedQueue,
    fault: SharedFault,
) -> Result<cpal::Stream, SinkError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels.max(1));
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut q = match queue.lock() {
                Ok(q) => q,
                Err(poisoned) => poisoned.into_inner(),
            };
            for frame in data.chunks_mut(channels) {
                let v = T::from_sample(q.next_sample());
                for out in frame {
                    *out = v;
                }
            }
        },
        move |e| {
            tracing::warn!(error = %e, "output stream error");
            if let Ok(mut f) = fault.lock() {
                *f = Some(e.to_string());
            }
        },
        None,
    )?;
    Ok(stream)
}

impl ToneSink for AudioDeviceSink {
    fn open(&mut self, spec: &ToneSpec) -> Result<(), SinkError> {
        self.close();

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
        let cfg = device.default_output_config()?;
        let device_rate = cfg.sample_rate().0;
        let stream_config: cpal::StreamConfig = cfg.clone().into();
        let tail = tail_latency(&stream_config.buffer_size, device_rate);

        tracing::debug!(
            device = ?device.name().ok(),
            sample_rate = device_rate,
            channels = stream_config.channels,
            format = ?cfg.sample_format(),
            "opening output device"
        );

        let tones = DeviceTones::new(&ToneBank::new(spec), device_rate);
        let queue: SharedQueue = Arc::new(Mutex::new(PcmQueue::new()));
        let fault: SharedFault = Arc::new(Mutex::new(None));

        let stream = match cfg.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(
                &device,
                &stream_config,
                Arc::clone(&queue),
                Arc::clone(&fault),
            )?,
            cpal::SampleFormat::I16 => build_stream::<i16>(
                &device,
                &stream_config,
                Arc::clone(&queue),
                Arc::clone(&fault),
            )?,
            cpal::SampleFormat::U16 => build_stream::<u16>(
                &device,
                &stream_config,
                Arc::clone(&queue),
                Arc::clone(&fault),
            )?,
            other => {
                return Err(SinkError::Device(format!(
                    "unsupported sample format: {other:?}"
                )));
            }
        };
        stream.play()?;

        self.active = Some(ActiveStream {
            stream,
            queue,
            fault,
            tones,
            device_rate,
            tail,
        });
        Ok(())
    }

    fn emit(&mut self, pulse: Pulse, _duration: Duration) -> Result<(), SinkError> {
        let active = self.active.as_ref().ok_or(SinkError::NotOpen)?;
        active.check_fault()?;
        active
            .queue
            .lock()
            .map_err(|_| poisoned())?
            .push(active.tones.buffer(pulse));

        // Block until the callback has taken everything we queued.
        loop {
            let remaining = active.queued()?;
            if remaining == 0 {
                break;
            }
            active.check_fault()?;
            let eta = Duration::from_secs_f64(remaining as f64 / f64::from(active.device_rate));
            std::thread::sleep(eta.clamp(Duration::from_micros(500), Duration::from_millis(5)));
        }
        Ok(())
    }

    fn close(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        // The queue is empty once `emit` returns, but the last callback
        // buffer is still in flight.
        std::thread::sleep(active.tail);
        if let Err(e) = active.stream.pause() {
            tracing::debug!(error = %e, "pause output stream");
        }
        if let Ok(mut q) = active.queue.lock() {
            if q.underruns() > 0 {
                tracing::trace!(underruns = q.underruns(), "output queue underruns");
            }
            q.clear();
        }
        tracing::debug!("output device released");
    }

    fn name(&self) -> &'static str {
        "audio"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::tail_latency;

    #[test]
    fn tail_covers_one_device_buffer() {
        assert_eq!(
            tail_latency(&cpal::BufferSize::Fixed(480), 48_000),
            Duration::from_millis(10)
        );
        assert_eq!(
            tail_latency(&cpal::BufferSize::Default, 44_100),
            Duration::from_millis(50)
        );
        assert_eq!(tail_latency(&cpal::BufferSize::Fixed(256), 0), Duration::ZERO);
    }
}
