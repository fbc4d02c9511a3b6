/// Input state tracker and key bindings.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered fire / dig / menu keys (only on initial press)
///   - Movement, fire and dig together in the same tick
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// ## Bindings
///
/// ┌────────────────────┬──────────────────────────────┐
/// │ Keys               │ Action                        │
/// ├────────────────────┼──────────────────────────────┤
/// │ ↑ ↓ ← → / W S A D  │ move / climb / jump (held)    │
/// │ Q / E              │ jump-roll left / right (held) │
/// │ Space / F          │ fire                          │
/// │ Z / X / C          │ dig below-left / below / right│
/// │ Esc                │ pause                         │
/// │ R                  │ restart level                 │
/// │ N / P              │ next / previous level         │
/// │ F5 / F9            │ quicksave / quickload         │
/// │ Ctrl+C             │ quit                          │
/// └────────────────────┴──────────────────────────────┘

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use pitrunner::{Cell, FrameInput, MoveKeys};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Front-end commands outside the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Pause,
    Restart,
    NextLevel,
    PrevLevel,
    QuickSave,
    QuickLoad,
    Quit,
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain. Edge-triggered actions read these.
    fresh_presses: Vec<KeyCode>,

    ctrl_c: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply_key(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply_key(&mut self, key: KeyEvent, at: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && normalize(key.code) == KeyCode::Char('c') {
            self.ctrl_c = true;
            return;
        }
        let code = normalize(key.code);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            // without enhancement, releases expire by timeout instead
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(code, at);
                self.last_active.insert(code, at);
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    // ── Mapping ──

    /// Held movement keys plus this frame's fire/dig presses.
    /// Dig targets are relative to `player` (the player's current cell).
    pub fn frame_input(&self, player: Cell) -> FrameInput {
        let keys = MoveKeys {
            up: self.any_held(&[KeyCode::Up, KeyCode::Char('w')]),
            down: self.any_held(&[KeyCode::Down, KeyCode::Char('s')]),
            left: self.any_held(&[KeyCode::Left, KeyCode::Char('a')]),
            right: self.any_held(&[KeyCode::Right, KeyCode::Char('d')]),
            up_left: self.is_held(KeyCode::Char('q')),
            up_right: self.is_held(KeyCode::Char('e')),
        };
        let dig_at = if self.was_pressed(KeyCode::Char('z')) {
            Some(player.offset(1, -1))
        } else if self.was_pressed(KeyCode::Char('x')) {
            Some(player.offset(1, 0))
        } else if self.was_pressed(KeyCode::Char('c')) {
            Some(player.offset(1, 1))
        } else {
            None
        };
        FrameInput {
            keys,
            fire: self.any_pressed(&[KeyCode::Char(' '), KeyCode::Char('f')]),
            dig_at,
        }
    }

    /// Commands pressed this frame, in a fixed order.
    pub fn commands(&self) -> Vec<Command> {
        let mut out = vec![];
        if self.ctrl_c {
            out.push(Command::Quit);
        }
        let table = [
            (KeyCode::Esc, Command::Pause),
            (KeyCode::Char('r'), Command::Restart),
            (KeyCode::Char('n'), Command::NextLevel),
            (KeyCode::Char('p'), Command::PrevLevel),
            (KeyCode::F(5), Command::QuickSave),
            (KeyCode::F(9), Command::QuickLoad),
        ];
        for (code, cmd) in table {
            if self.was_pressed(code) {
                out.push(cmd);
            }
        }
        out
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, at: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| at.saturating_duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Letter keys are matched case-insensitively.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
