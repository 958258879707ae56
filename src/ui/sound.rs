/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_rotate: Arc<Vec<u8>>,
        sfx_teleport: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_hazard: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            let sfx_rotate = Arc::new(make_wav(&gen_rotate()));
            let sfx_teleport = Arc::new(make_wav(&gen_teleport()));
            let sfx_land = Arc::new(make_wav(&gen_land()));
            let sfx_hazard = Arc::new(make_wav(&gen_hazard()));
            let sfx_clear = Arc::new(make_wav(&gen_clear()));
            let sfx_win = Arc::new(make_wav(&gen_win()));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_rotate,
                sfx_teleport,
                sfx_land,
                sfx_hazard,
                sfx_clear,
                sfx_win,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_rotate(&self) { self.play(&self.sfx_rotate); }
        pub fn play_teleport(&self) { self.play(&self.sfx_teleport); }
        pub fn play_land(&self) { self.play(&self.sfx_land); }
        pub fn play_hazard(&self) { self.play(&self.sfx_hazard); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Rotate: short bright blip, slight upward chirp
    fn gen_rotate() -> Vec<f32> {
        let duration = 0.05;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 620.0 + t * 240.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - t;
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Portal: warbling upward sweep
    fn gen_teleport() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 300.0 + t * 600.0;
                let wobble = (ti * 30.0 * 2.0 * std::f32::consts::PI).sin() * 40.0;
                let env = (1.0 - t).powf(0.5);
                (ti * (freq + wobble) * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Landing thump: low, short, fast decay
    fn gen_land() -> Vec<f32> {
        let duration = 0.07;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 180.0 - t * 60.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(1.5);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3
            })
            .collect()
    }

    /// Spike hit: harsh noise burst over a falling tone
    fn gen_hazard() -> Vec<f32> {
        let duration = 0.3;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 400.0 - t * 280.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * 0.5 + noise * 0.5) * env * 0.3
            })
            .collect()
    }

    /// Grid clear: quick rising arpeggio with a held, vibrato top note
    fn gen_clear() -> Vec<f32> {
        let notes = [659.0_f32, 784.0, 988.0, 1319.0]; // E5→G5→B5→E6
        let note_dur = 0.08;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7) * 0.4;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.75
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.25;
                samples.push(wave * env * 0.28);
            }
        }
        // Hold the top note, slow vibrato, fade out
        let top = 1319.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.3) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let fade = 1.0 - (i as f32 / n as f32);
            let vib = (t * 6.0 * 2.0 * std::f32::consts::PI).sin() * 5.0;
            samples.push((t * (top + vib) * 2.0 * std::f32::consts::PI).sin() * fade * 0.28);
        }
        samples
    }

    /// All grids clear: longer two-phrase fanfare
    fn gen_win() -> Vec<f32> {
        let notes = [
            (523.0_f32, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.18),
            (784.0, 0.09), (1047.0, 0.35),
        ]; // C5 E5 G5 C6, G5 C6
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5) * 0.6;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        // Final fade
        let fade_len = samples.len() / 5;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_rotate(&self) {}
    pub fn play_teleport(&self) {}
    pub fn play_land(&self) {}
    pub fn play_hazard(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_win(&self) {}
}
