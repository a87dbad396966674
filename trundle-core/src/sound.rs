//! Tone and melody playback
//!
//! The buzzer is driven by a steppable sequencer so a melody never blocks the
//! loop: each note holds the tone for its duration, then a silent gap before
//! the next note. A one-shot tone and a new melody both preempt whatever is
//! playing. The buzzer itself only knows "tone on at frequency" and "silent".

use embassy_time::{Duration, Instant};

use crate::hal::Buzzer;

/// One melody step: tone frequency, hold time, trailing silence
#[derive(Debug, Clone, Copy)]
struct Note {
    freq_hz: u16,
    duration_ms: u64,
    gap_ms: u64,
}

const fn note(freq_hz: u16, duration_ms: u64, gap_ms: u64) -> Note {
    Note {
        freq_hz,
        duration_ms,
        gap_ms,
    }
}

/// C5 D5 E5 G5 A5 G5 E5
const HAPPY: [Note; 7] = [
    note(523, 150, 50),
    note(587, 150, 50),
    note(659, 150, 50),
    note(784, 150, 50),
    note(880, 300, 50),
    note(784, 150, 50),
    note(659, 300, 50),
];

/// G4 C5 E5 G5 E5 G5 A5
const VICTORY: [Note; 7] = [
    note(392, 150, 50),
    note(523, 150, 50),
    note(659, 150, 50),
    note(784, 300, 50),
    note(659, 150, 50),
    note(784, 150, 50),
    note(880, 500, 50),
];

/// Two descending low tones
const ERROR: [Note; 2] = [note(200, 200, 100), note(150, 400, 0)];

/// C4 E4 G4 C5 boot chime
const STARTUP: [Note; 4] = [
    note(262, 100, 20),
    note(330, 100, 20),
    note(392, 100, 20),
    note(523, 300, 20),
];

/// Built-in melody selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Melody {
    Happy,
    Victory,
    Error,
    Startup,
}

impl Melody {
    fn notes(self) -> &'static [Note] {
        match self {
            Melody::Happy => &HAPPY,
            Melody::Victory => &VICTORY,
            Melody::Error => &ERROR,
            Melody::Startup => &STARTUP,
        }
    }
}

enum State {
    Idle,
    /// Tone held for the current note
    Sounding {
        notes: &'static [Note],
        index: usize,
        until: Instant,
    },
    /// Silence between notes
    Gap {
        notes: &'static [Note],
        index: usize,
        until: Instant,
    },
    /// Single explicit tone outside any melody
    OneShot {
        until: Instant,
    },
}

/// Non-blocking melody/tone playback state machine
pub struct ToneSequencer {
    state: State,
}

impl Default for ToneSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneSequencer {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn active(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Start a melody from its first note, preempting anything playing.
    pub fn play<Z: Buzzer>(&mut self, buzzer: &mut Z, melody: Melody, now: Instant) {
        debug!("melody start");
        let notes = melody.notes();
        let first = notes[0];
        buzzer.set_tone(first.freq_hz);
        self.state = State::Sounding {
            notes,
            index: 0,
            until: now + Duration::from_millis(first.duration_ms),
        };
    }

    /// Sound a single tone for a fixed duration, preempting anything playing.
    pub fn tone<Z: Buzzer>(&mut self, buzzer: &mut Z, freq_hz: u16, duration_ms: u64, now: Instant) {
        buzzer.set_tone(freq_hz);
        self.state = State::OneShot {
            until: now + Duration::from_millis(duration_ms),
        };
    }

    /// Silence the buzzer and drop any pending notes.
    pub fn stop<Z: Buzzer>(&mut self, buzzer: &mut Z) {
        buzzer.silence();
        self.state = State::Idle;
    }

    /// Advance playback; call once per loop tick.
    pub fn step<Z: Buzzer>(&mut self, buzzer: &mut Z, now: Instant) {
        match self.state {
            State::Idle => {}
            State::OneShot { until } => {
                if now >= until {
                    buzzer.silence();
                    self.state = State::Idle;
                }
            }
            State::Sounding { notes, index, until } => {
                if now >= until {
                    buzzer.silence();
                    let gap = notes[index].gap_ms;
                    self.state = State::Gap {
                        notes,
                        index,
                        until: now + Duration::from_millis(gap),
                    };
                }
            }
            State::Gap { notes, index, until } => {
                if now >= until {
                    let next = index + 1;
                    if let Some(n) = notes.get(next) {
                        buzzer.set_tone(n.freq_hz);
                        self.state = State::Sounding {
                            notes,
                            index: next,
                            until: now + Duration::from_millis(n.duration_ms),
                        };
                    } else {
                        self.state = State::Idle;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimBuzzer;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn melody_walks_notes_with_gaps() {
        let mut buzzer = SimBuzzer::new();
        let mut seq = ToneSequencer::new();

        seq.play(&mut buzzer, Melody::Startup, at(0));
        assert_eq!(buzzer.tones, vec![262]);

        // First note ends at 100 ms, gap runs to 120 ms.
        seq.step(&mut buzzer, at(50));
        assert_eq!(buzzer.silences, 0);
        seq.step(&mut buzzer, at(100));
        assert_eq!(buzzer.silences, 1);
        seq.step(&mut buzzer, at(110));
        assert_eq!(buzzer.tones, vec![262]);
        seq.step(&mut buzzer, at(120));
        assert_eq!(buzzer.tones, vec![262, 330]);
    }

    #[test]
    fn melody_runs_to_completion_and_goes_idle() {
        let mut buzzer = SimBuzzer::new();
        let mut seq = ToneSequencer::new();

        seq.play(&mut buzzer, Melody::Startup, at(0));
        let mut now = 0;
        while seq.active() {
            now += 10;
            assert!(now < 2000, "melody should finish");
            seq.step(&mut buzzer, at(now));
        }
        // All four notes were sounded.
        assert_eq!(buzzer.tones, vec![262, 330, 392, 523]);
        // Idle sequencer stays silent.
        seq.step(&mut buzzer, at(now + 1000));
        assert_eq!(buzzer.tones.len(), 4);
    }

    #[test]
    fn one_shot_tone_silences_after_duration() {
        let mut buzzer = SimBuzzer::new();
        let mut seq = ToneSequencer::new();

        seq.tone(&mut buzzer, 1000, 200, at(0));
        assert_eq!(buzzer.tones, vec![1000]);
        seq.step(&mut buzzer, at(199));
        assert_eq!(buzzer.silences, 0);
        seq.step(&mut buzzer, at(200));
        assert_eq!(buzzer.silences, 1);
        assert!(!seq.active());
    }

    #[test]
    fn new_melody_preempts_the_current_one() {
        let mut buzzer = SimBuzzer::new();
        let mut seq = ToneSequencer::new();

        seq.play(&mut buzzer, Melody::Happy, at(0));
        seq.play(&mut buzzer, Melody::Error, at(50));
        assert_eq!(buzzer.tones, vec![523, 200]);
    }

    #[test]
    fn stop_silences_and_drops_pending_notes() {
        let mut buzzer = SimBuzzer::new();
        let mut seq = ToneSequencer::new();

        seq.play(&mut buzzer, Melody::Victory, at(0));
        seq.stop(&mut buzzer);
        assert!(!seq.active());
        assert_eq!(buzzer.silences, 1);
        seq.step(&mut buzzer, at(5000));
        assert_eq!(buzzer.tones.len(), 1);
    }
}
