/// Sound effects: procedural chiptune blips played through rodio.
///
/// Every effect is a short list of tone segments (pitch sweep, noise mix,
/// volume) rendered once into mono f32 samples at start-up. Playback is
/// fire-and-forget on a detached sink.
///
/// Built without the "sound" feature, `SoundEngine` is a silent stub with
/// the same API.

use pitrunner::GameEvent;

const SAMPLE_RATE: u32 = 22050;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Coin,
    Dig,
    Fire,
    Explosion,
    Caught,
    Clear,
}

impl Sfx {
    pub const ALL: [Sfx; 6] = [Sfx::Coin, Sfx::Dig, Sfx::Fire, Sfx::Explosion, Sfx::Caught, Sfx::Clear];

    /// The effect a simulation event sounds like, if any.
    pub fn for_event(ev: &GameEvent) -> Option<Sfx> {
        match ev {
            GameEvent::CoinCollected { .. } => Some(Sfx::Coin),
            GameEvent::HoleDug { .. } => Some(Sfx::Dig),
            GameEvent::FireballLaunched => Some(Sfx::Fire),
            GameEvent::Exploded { .. } => Some(Sfx::Explosion),
            GameEvent::PlayerCaught => Some(Sfx::Caught),
            GameEvent::LevelCompleted { .. } => Some(Sfx::Clear),
            _ => None,
        }
    }

    fn segments(self) -> &'static [Segment] {
        match self {
            Sfx::Coin => COIN,
            Sfx::Dig => DIG,
            Sfx::Fire => FIRE,
            Sfx::Explosion => EXPLOSION,
            Sfx::Caught => CAUGHT,
            Sfx::Clear => CLEAR,
        }
    }
}

// ── Effect tables ──

const COIN: &[Segment] = &[
    Segment::tone(1047.0, 0.045, 0.25),
    Segment::tone(1319.0, 0.045, 0.25),
    Segment::tone(1568.0, 0.06, 0.25),
];
const DIG: &[Segment] = &[Segment { from_hz: 500.0, to_hz: 200.0, secs: 0.12, noise: 0.6, volume: 0.3 }];
const FIRE: &[Segment] = &[Segment { from_hz: 900.0, to_hz: 1400.0, secs: 0.08, noise: 0.1, volume: 0.2 }];
const EXPLOSION: &[Segment] = &[Segment { from_hz: 160.0, to_hz: 40.0, secs: 0.35, noise: 0.85, volume: 0.4 }];
const CAUGHT: &[Segment] = &[
    Segment::tone(440.0, 0.12, 0.3),
    Segment::tone(370.0, 0.12, 0.3),
    Segment::tone(311.0, 0.12, 0.3),
    Segment::tone(261.0, 0.25, 0.3),
];
const CLEAR: &[Segment] = &[
    Segment::tone(523.0, 0.1, 0.3),
    Segment::tone(659.0, 0.1, 0.3),
    Segment::tone(784.0, 0.1, 0.3),
    Segment::tone(1047.0, 0.3, 0.3),
];

/// One piece of an effect: a linear pitch sweep with optional noise.
struct Segment {
    from_hz: f32,
    to_hz: f32,
    secs: f32,
    noise: f32,
    volume: f32,
}

impl Segment {
    const fn tone(hz: f32, secs: f32, volume: f32) -> Self {
        Segment { from_hz: hz, to_hz: hz, secs, noise: 0.0, volume }
    }
}

/// Render an effect to mono samples in `[-1, 1]`.
pub fn synth(sfx: Sfx) -> Vec<f32> {
    let mut out = Vec::new();
    let mut rng: u32 = 0x2545_f491;
    for seg in sfx.segments() {
        let n = (SAMPLE_RATE as f32 * seg.secs) as usize;
        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let hz = seg.from_hz + (seg.to_hz - seg.from_hz) * t;
            phase += hz / SAMPLE_RATE as f32;
            // sine plus a third harmonic for a squarer, retro edge
            let tone = (phase * std::f32::consts::TAU).sin() * 0.75
                + (phase * 3.0 * std::f32::consts::TAU).sin() * 0.25;
            rng ^= rng << 13;
            rng ^= rng >> 17;
            rng ^= rng << 5;
            let noise = rng as f32 / u32::MAX as f32 * 2.0 - 1.0;
            let env = (1.0 - t).sqrt();
            let s = (tone * (1.0 - seg.noise) + noise * seg.noise) * env * seg.volume;
            out.push(s.clamp(-1.0, 1.0));
        }
    }
    out
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx, SAMPLE_RATE};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        bank: HashMap<Sfx, Vec<f32>>,
    }

    impl SoundEngine {
        /// `None` when no audio device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio disabled: {e}");
                    return None;
                }
            };
            let bank = Sfx::ALL.iter().map(|&s| (s, synth(s))).collect();
            Some(SoundEngine { _stream: stream, handle, bank })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(samples) = self.bank.get(&sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.clone()));
                sink.detach();
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitrunner::Cell;

    #[test]
    fn every_effect_renders_in_range() {
        for sfx in Sfx::ALL {
            let s = synth(sfx);
            assert!(!s.is_empty(), "{sfx:?}");
            assert!(s.iter().all(|v| (-1.0..=1.0).contains(v)), "{sfx:?}");
        }
    }

    #[test]
    fn events_map_to_effects() {
        assert_eq!(Sfx::for_event(&GameEvent::CoinCollected { cell: Cell::new(0, 0) }), Some(Sfx::Coin));
        assert_eq!(Sfx::for_event(&GameEvent::PlayerCaught), Some(Sfx::Caught));
        assert_eq!(Sfx::for_event(&GameEvent::HoleClosed { cell: Cell::new(0, 0) }), None);
    }
}
