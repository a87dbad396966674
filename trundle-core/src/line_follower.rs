//! Line following
//!
//! Proportional controller on the weighted line position. Each of the 8
//! channels is thresholded to binary; the centroid of active channels over
//! positions 0..7000 is the line position and its distance from center 3500
//! the error. When no channel sees the line the controller issues nothing and
//! the previous motor command stays in effect (coast-through-gaps behavior,
//! reproduced deliberately).

use crate::motion::MotionCommand;
use crate::sensing::SensorFrame;

/// Position weight per channel; channel i sits at `i * 1000`
const CHANNEL_SPACING: i32 = 1000;

/// Nominal line-centered position
const CENTER: f32 = 3500.0;

/// Default proportional gain
pub const DEFAULT_KP: f32 = 0.5;

/// Default base speed percentage
pub const DEFAULT_BASE_PERCENT: u8 = 50;

/// Intersection shapes the edge/center band classifier can match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Intersection {
    LeftBranch,
    RightBranch,
    Tee,
    Cross,
}

/// Line-follower configuration and controller; enabled only by command
pub struct LineFollower {
    enabled: bool,
    base_percent: u8,
    kp: f32,
}

impl Default for LineFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFollower {
    pub fn new() -> Self {
        Self {
            enabled: false,
            base_percent: DEFAULT_BASE_PERCENT,
            kp: DEFAULT_KP,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable/disable; enabling resets the base speed to the given
    /// percentage (default 50 when absent). Disabling takes effect on the
    /// next tick.
    pub fn set_enabled(&mut self, enable: bool, speed_percent: Option<u8>) {
        self.enabled = enable;
        if enable {
            self.base_percent = speed_percent.unwrap_or(DEFAULT_BASE_PERCENT).min(100);
        }
    }

    /// Adjust the base speed scale without toggling the controller
    pub fn set_base_percent(&mut self, percent: u8) {
        self.base_percent = percent.min(100);
    }

    /// One control decision. `None` means: leave the previous motor command
    /// in effect this tick.
    pub fn step(&self, frame: &SensorFrame) -> Option<MotionCommand> {
        if !self.enabled {
            return None;
        }

        let mut weighted = 0i32;
        let mut active = 0i32;
        for channel in 0..8 {
            if frame.line_detected(channel) {
                weighted += channel as i32 * CHANNEL_SPACING;
                active += 1;
            }
        }
        if active == 0 {
            // Line lost or gap: no actuation this tick.
            return None;
        }

        let position = weighted as f32 / active as f32;
        let error = position - CENTER;
        let correction = (error * self.kp) as i16;

        // Base speed percent maps onto 0..200 duty.
        let base = self.base_percent as i16 * 2;
        Some(MotionCommand {
            left: base + correction,
            right: base - correction,
        })
    }
}

/// Pure query over the two edge channels and the 4-channel center band;
/// not part of the control loop. The T and cross patterns are
/// indistinguishable to this sensor geometry and share a condition.
pub fn intersection_matches(frame: &SensorFrame, shape: Intersection) -> bool {
    let left_edge = frame.line_detected(0);
    let right_edge = frame.line_detected(7);
    let center = (2..6).any(|ch| frame.line_detected(ch));

    match shape {
        Intersection::LeftBranch => left_edge && center && !right_edge,
        Intersection::RightBranch => right_edge && center && !left_edge,
        Intersection::Tee | Intersection::Cross => left_edge && right_edge && center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::SensorFrame;
    use embassy_time::Instant;

    const ON: u16 = 900;

    fn frame_with(channels: &[usize]) -> SensorFrame {
        let mut frame = SensorFrame::empty(Instant::from_millis(0));
        for &ch in channels {
            frame.line[ch] = ON;
        }
        frame
    }

    fn enabled_follower(base: u8) -> LineFollower {
        let mut f = LineFollower::new();
        f.set_enabled(true, Some(base));
        f
    }

    #[test]
    fn disabled_controller_never_actuates() {
        let follower = LineFollower::new();
        assert!(follower.step(&frame_with(&[3])).is_none());
    }

    #[test]
    fn no_active_channel_leaves_previous_command() {
        let follower = enabled_follower(50);
        assert!(follower.step(&frame_with(&[])).is_none());
    }

    #[test]
    fn leftmost_channel_produces_full_negative_correction() {
        // Position 0, error -3500, Kp 0.5 -> correction -1750.
        let follower = enabled_follower(50);
        let cmd = follower.step(&frame_with(&[0])).unwrap();
        assert_eq!(cmd.left, 100 - 1750);
        assert_eq!(cmd.right, 100 + 1750);
    }

    #[test]
    fn centered_line_drives_straight() {
        // Channels 3 and 4 -> position 3500, zero error.
        let follower = enabled_follower(50);
        let cmd = follower.step(&frame_with(&[3, 4])).unwrap();
        assert_eq!(cmd.left, 100);
        assert_eq!(cmd.right, 100);
    }

    #[test]
    fn rightward_offset_steers_right() {
        // Channel 5 -> position 5000, error 1500, correction 750.
        let follower = enabled_follower(50);
        let cmd = follower.step(&frame_with(&[5])).unwrap();
        assert_eq!(cmd.left, 100 + 750);
        assert_eq!(cmd.right, 100 - 750);
    }

    #[test]
    fn enable_without_speed_defaults_to_fifty_percent() {
        let mut follower = LineFollower::new();
        follower.set_enabled(true, None);
        let cmd = follower.step(&frame_with(&[3, 4])).unwrap();
        assert_eq!(cmd.left, 100);
    }

    #[test]
    fn intersection_patterns_classify_by_edges_and_center() {
        let left_t = frame_with(&[0, 3, 4]);
        assert!(intersection_matches(&left_t, Intersection::LeftBranch));
        assert!(!intersection_matches(&left_t, Intersection::RightBranch));
        assert!(!intersection_matches(&left_t, Intersection::Cross));

        let right_t = frame_with(&[4, 7]);
        assert!(intersection_matches(&right_t, Intersection::RightBranch));

        let full = frame_with(&[0, 2, 5, 7]);
        assert!(intersection_matches(&full, Intersection::Tee));
        assert!(intersection_matches(&full, Intersection::Cross));

        // Edge channels alone without the center band match nothing.
        let edges_only = frame_with(&[0, 7]);
        assert!(!intersection_matches(&edges_only, Intersection::Tee));
    }
}
