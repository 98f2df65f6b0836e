//! Two-finger swipe-down recognition on raw pointer samples.
//!
//! Classification is a pure predicate so it can run directly on the input
//! delivery path.

use crate::config::GestureConfig;

/// Pointer sample kind as reported by the input system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One pointer sample with every active touch point.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub action: PointerAction,
    pub points: Vec<TouchPoint>,
}

impl GestureEvent {
    /// A `Move` sample with two touch points.
    pub fn two_finger_move(first: TouchPoint, second: TouchPoint) -> Self {
        Self {
            action: PointerAction::Move,
            points: vec![first, second],
        }
    }
}

/// Whether `event` is a two-finger swipe down.
///
/// Only `Move` samples with exactly two touch points qualify.
/// The second point must sit more than `min_vertical_drop` below the first,
/// and the horizontal distance between them must stay under
/// `max_horizontal_spread`.
///
/// # Examples
///
/// ```
/// use risa::config::GestureConfig;
/// use risa::gesture::{GestureEvent, TouchPoint, is_swipe_down};
///
/// let config = GestureConfig::default();
/// let swipe = GestureEvent::two_finger_move(TouchPoint::new(100.0, 200.0), TouchPoint::new(200.0, 280.0));
/// assert!(is_swipe_down(&swipe, &config));
/// ```
#[must_use]
pub fn is_swipe_down(event: &GestureEvent, config: &GestureConfig) -> bool {
    if event.action != PointerAction::Move {
        return false;
    }
    let [first, second] = event.points.as_slice() else {
        return false;
    };
    let drop = second.y - first.y;
    let spread = (second.x - first.x).abs();
    spread < config.max_horizontal_spread && drop > config.min_vertical_drop
}
