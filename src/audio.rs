//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!

use web_sys::OscillatorType::{Sine, Square, Triangle};
use web_sys::{AudioContext, OscillatorType};

use fish_frenzy::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Round started
    Start,
    /// Ate a fish
    Eat,
    /// Ate a fish nearly our own size
    CloseCall,
    /// Bumped a similar-sized fish
    Bump,
    /// Eaten by a bigger fish
    GameOver,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Sound for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Started => Some(SoundEffect::Start),
            GameEvent::Ate {
                close_call: true, ..
            } => Some(SoundEffect::CloseCall),
            GameEvent::Ate { .. } => Some(SoundEffect::Eat),
            GameEvent::Bumped => Some(SoundEffect::Bump),
            GameEvent::Eaten { .. } => Some(SoundEffect::GameOver),
            GameEvent::ModelRequested(_) | GameEvent::SpawnAbandoned(_) => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Combined master * sfx volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let now = ctx.current_time();
        for note in effect.notes() {
            if schedule(ctx, note, now, vol).is_none() {
                log::debug!("Dropped note for {:?}", effect);
            }
        }
    }
}

/// One enveloped oscillator voice
struct Note {
    wave: OscillatorType,
    freq: f32,
    /// Exponential glide target reached at the end of the note
    glide_to: Option<f32>,
    /// Offset from the moment the effect fires (seconds)
    at: f64,
    length: f64,
    gain: f32,
}

const fn note(wave: OscillatorType, freq: f32, at: f64, length: f64, gain: f32) -> Note {
    Note {
        wave,
        freq,
        glide_to: None,
        at,
        length,
        gain,
    }
}

const fn glide(wave: OscillatorType, from: f32, to: f32, length: f64, gain: f32) -> Note {
    Note {
        wave,
        freq: from,
        glide_to: Some(to),
        at: 0.0,
        length,
        gain,
    }
}

const START: &[Note] = &[glide(Triangle, 200.0, 600.0, 0.3, 0.3)];
const EAT: &[Note] = &[glide(Sine, 520.0, 180.0, 0.12, 0.35)];
const CLOSE_CALL: &[Note] = &[
    note(Square, 440.0, 0.0, 0.12, 0.15),
    note(Square, 660.0, 0.07, 0.12, 0.15),
    note(Square, 880.0, 0.14, 0.12, 0.15),
];
const BUMP: &[Note] = &[glide(Sine, 120.0, 60.0, 0.1, 0.4)];
const GAME_OVER: &[Note] = &[
    note(Sine, 400.0, 0.0, 0.3, 0.3),
    note(Sine, 350.0, 0.2, 0.3, 0.3),
    note(Sine, 300.0, 0.4, 0.3, 0.3),
    note(Sine, 200.0, 0.6, 0.45, 0.3),
];
const HIGH_SCORE: &[Note] = &[
    note(Triangle, 523.0, 0.0, 0.25, 0.25),
    note(Triangle, 659.0, 0.08, 0.25, 0.25),
    note(Triangle, 784.0, 0.16, 0.25, 0.25),
    note(Triangle, 1047.0, 0.24, 0.4, 0.25),
];

impl SoundEffect {
    fn notes(self) -> &'static [Note] {
        match self {
            SoundEffect::Start => START,
            SoundEffect::Eat => EAT,
            SoundEffect::CloseCall => CLOSE_CALL,
            SoundEffect::Bump => BUMP,
            SoundEffect::GameOver => GAME_OVER,
            SoundEffect::HighScore => HIGH_SCORE,
        }
    }
}

/// Wire oscillator -> gain -> speakers and schedule the envelope
fn schedule(ctx: &AudioContext, note: &Note, now: f64, vol: f32) -> Option<()> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;
    osc.set_type(note.wave);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    let start = now + note.at;
    let end = start + note.length;
    osc.frequency().set_value_at_time(note.freq, start).ok()?;
    if let Some(target) = note.glide_to {
        osc.frequency()
            .exponential_ramp_to_value_at_time(target, end)
            .ok()?;
    }
    gain.gain().set_value_at_time(vol * note.gain, start).ok()?;
    gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok()?;

    osc.start_with_when(start).ok()?;
    osc.stop_with_when(end + 0.05).ok()?;
    Some(())
}
