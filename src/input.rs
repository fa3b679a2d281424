//! Keyboard and touch joystick input
//!
//! Both sources feed the same logical actions. The host keeps one
//! [`InputState`] and hands its [`TickInput`] to every simulation frame.

use glam::Vec2;

use crate::sim::TickInput;

/// Joystick travel in CSS pixels
pub const JOYSTICK_RADIUS: f32 = 50.0;
/// Normalised deflection below which an axis is ignored
pub const JOYSTICK_DEAD_ZONE: f32 = 0.2;
/// Fraction of full travel that engages sprint
pub const JOYSTICK_SPRINT: f32 = 0.8;

/// A logical action a key can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TurnLeft,
    TurnRight,
    PitchUp,
    PitchDown,
    Sprint,
}

/// Map a DOM `KeyboardEvent.key` value to an action
pub fn action_for_key(key: &str) -> Option<Action> {
    let action = match key {
        "ArrowLeft" => Action::TurnLeft,
        "ArrowRight" => Action::TurnRight,
        "ArrowUp" => Action::PitchUp,
        "ArrowDown" => Action::PitchDown,
        "Shift" => Action::Sprint,
        _ => match key.to_ascii_lowercase().as_str() {
            "a" => Action::TurnLeft,
            "d" => Action::TurnRight,
            "w" => Action::PitchUp,
            "s" => Action::PitchDown,
            _ => return None,
        },
    };
    Some(action)
}

fn set_action(input: &mut TickInput, action: Action, held: bool) {
    match action {
        Action::TurnLeft => input.turn_left = held,
        Action::TurnRight => input.turn_right = held,
        Action::PitchUp => input.pitch_up = held,
        Action::PitchDown => input.pitch_down = held,
        Action::Sprint => input.sprint = held,
    }
}

/// Held keyboard actions
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBindings {
    held: TickInput,
}

impl KeyBindings {
    /// Returns true if the key is bound (the host should `preventDefault`)
    pub fn apply_key(&mut self, key: &str, pressed: bool) -> bool {
        match action_for_key(key) {
            Some(action) => {
                set_action(&mut self.held, action, pressed);
                true
            }
            None => false,
        }
    }

    pub fn held(&self) -> TickInput {
        self.held
    }

    /// Drop everything, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.held = TickInput::default();
    }
}

/// On-screen joystick
#[derive(Debug, Clone, Copy, Default)]
pub struct Joystick {
    /// Knob offset from the base centre, clamped to the radius
    pub knob: Vec2,
    held: TickInput,
}

impl Joystick {
    /// Update from a touch offset (screen pixels, +y down)
    pub fn update(&mut self, dx: f32, dy: f32) {
        let offset = Vec2::new(dx, dy);
        let distance = offset.length().min(JOYSTICK_RADIUS);
        self.knob = offset.normalize_or_zero() * distance;

        let n = self.knob / JOYSTICK_RADIUS;
        self.held = TickInput {
            pitch_up: n.y < -JOYSTICK_DEAD_ZONE,
            pitch_down: n.y > JOYSTICK_DEAD_ZONE,
            turn_left: n.x < -JOYSTICK_DEAD_ZONE,
            turn_right: n.x > JOYSTICK_DEAD_ZONE,
            sprint: distance > JOYSTICK_RADIUS * JOYSTICK_SPRINT,
        };
    }

    /// Touch ended: recentre and release every action
    pub fn release(&mut self) {
        *self = Self::default();
    }

    pub fn held(&self) -> TickInput {
        self.held
    }
}

/// Combined input from every source
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub keys: KeyBindings,
    pub joystick: Joystick,
}

impl InputState {
    /// Actions held by any source
    pub fn tick_input(&self) -> TickInput {
        let k = self.keys.held();
        let j = self.joystick.held();
        TickInput {
            turn_left: k.turn_left || j.turn_left,
            turn_right: k.turn_right || j.turn_right,
            pitch_up: k.pitch_up || j.pitch_up,
            pitch_down: k.pitch_down || j.pitch_down,
            sprint: k.sprint || j.sprint,
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.joystick.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping_is_case_insensitive() {
        assert_eq!(action_for_key("a"), Some(Action::TurnLeft));
        assert_eq!(action_for_key("A"), Some(Action::TurnLeft));
        assert_eq!(action_for_key("D"), Some(Action::TurnRight));
        assert_eq!(action_for_key("w"), Some(Action::PitchUp));
        assert_eq!(action_for_key("S"), Some(Action::PitchDown));
        assert_eq!(action_for_key("ArrowUp"), Some(Action::PitchUp));
        assert_eq!(action_for_key("Shift"), Some(Action::Sprint));
        assert_eq!(action_for_key("q"), None);
        assert_eq!(action_for_key("Enter"), None);
    }

    #[test]
    fn test_press_and_release() {
        let mut keys = KeyBindings::default();
        assert!(keys.apply_key("d", true));
        assert!(keys.apply_key("Shift", true));
        assert!(keys.held().turn_right && keys.held().sprint);
        keys.apply_key("D", false);
        assert!(!keys.held().turn_right);
        assert!(keys.held().sprint);
        assert!(!keys.apply_key("x", true));
    }

    #[test]
    fn test_joystick_dead_zone() {
        let mut stick = Joystick::default();
        stick.update(5.0, -5.0);
        assert_eq!(stick.held(), TickInput::default());
    }

    #[test]
    fn test_joystick_directions() {
        let mut stick = Joystick::default();
        stick.update(-20.0, -20.0);
        let held = stick.held();
        assert!(held.turn_left && held.pitch_up);
        assert!(!held.turn_right && !held.pitch_down && !held.sprint);
    }

    #[test]
    fn test_joystick_clamps_and_sprints() {
        let mut stick = Joystick::default();
        stick.update(200.0, 0.0);
        assert_eq!(stick.knob, Vec2::new(JOYSTICK_RADIUS, 0.0));
        assert!(stick.held().turn_right && stick.held().sprint);

        stick.release();
        assert_eq!(stick.knob, Vec2::ZERO);
        assert_eq!(stick.held(), TickInput::default());
    }

    #[test]
    fn test_sources_combine() {
        let mut input = InputState::default();
        input.keys.apply_key("a", true);
        input.joystick.update(0.0, 45.0);
        let held = input.tick_input();
        assert!(held.turn_left && held.pitch_down && held.sprint);

        input.clear();
        assert_eq!(input.tick_input(), TickInput::default());
    }
}
