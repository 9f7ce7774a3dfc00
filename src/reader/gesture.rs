//! Touch gesture interpreter
//!
//! Turns raw touch sequences into navigation intents. It never touches the
//! navigation state itself; the shell decides what an intent does, so the
//! same interpreter works whatever the gesture settings are.

use std::time::Duration;

use super::navigation::{PAN_ZOOM_THRESHOLD, clamp_zoom};

/// Longest press still counted as a tap
pub const TAP_MAX_DURATION: Duration = Duration::from_millis(300);
/// Finger travel (px) still counted as a tap
pub const TAP_MAX_MOVEMENT: f32 = 10.0;
/// Max gap between two taps forming a double-tap
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
/// Horizontal travel (px) needed for a swipe
pub const SWIPE_THRESHOLD: f32 = 50.0;
/// Pinches starting with fingers closer than this are ignored
const MIN_PINCH_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: TouchPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    /// Fingers lifted; `touches` holds the lifted points if known
    End,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
    /// Monotonic timestamp of the event
    pub at: Duration,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, at: Duration) -> Self {
        Self { phase, touches, at }
    }
}

/// View parameters the interpreter needs at gesture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSnapshot {
    pub zoom: f32,
    pub pan: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right to left: next page
    Left,
    /// Finger moved left to right: previous page
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureIntent {
    ToggleZoom,
    Pan { x: f32, y: f32 },
    Swipe(SwipeDirection),
    Pinch { zoom: f32 },
}

#[derive(Debug, Clone, Copy, Default)]
enum Tracking {
    #[default]
    Idle,
    OneFinger {
        start: TouchPoint,
        last: TouchPoint,
        started_at: Duration,
        start_pan: (f32, f32),
        panning: bool,
    },
    Pinch {
        start_distance: f32,
        start_zoom: f32,
    },
}

#[derive(Debug, Default)]
pub struct GestureInterpreter {
    tracking: Tracking,
    last_tap: Option<Duration>,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &TouchEvent, view: ViewSnapshot) -> Option<GestureIntent> {
        match event.phase {
            TouchPhase::Start => {
                self.start(event, view);
                None
            }
            TouchPhase::Move => self.moved(event, view),
            TouchPhase::End => self.end(event),
            TouchPhase::Cancel => {
                self.reset();
                None
            }
        }
    }

    /// Forget any gesture in progress (e.g. on page change or teardown).
    pub fn reset(&mut self) {
        self.tracking = Tracking::Idle;
        self.last_tap = None;
    }

    fn start(&mut self, event: &TouchEvent, view: ViewSnapshot) {
        self.tracking = match event.touches.as_slice() {
            [] => Tracking::Idle,
            [point] => Tracking::OneFinger {
                start: *point,
                last: *point,
                started_at: event.at,
                start_pan: view.pan,
                panning: view.zoom > PAN_ZOOM_THRESHOLD,
            },
            [a, b, ..] => {
                self.last_tap = None;
                Self::pinch_from(*a, *b, view.zoom)
            }
        };
    }

    fn moved(&mut self, event: &TouchEvent, view: ViewSnapshot) -> Option<GestureIntent> {
        match (self.tracking, event.touches.as_slice()) {
            (
                Tracking::OneFinger {
                    start,
                    started_at,
                    start_pan,
                    panning,
                    ..
                },
                [point],
            ) => {
                self.tracking = Tracking::OneFinger {
                    start,
                    last: *point,
                    started_at,
                    start_pan,
                    panning,
                };
                panning.then(|| GestureIntent::Pan {
                    x: start_pan.0 + (point.x - start.x),
                    y: start_pan.1 + (point.y - start.y),
                })
            }
            (
                Tracking::Pinch {
                    start_distance,
                    start_zoom,
                },
                [a, b, ..],
            ) => {
                let scale = a.distance_to(*b) / start_distance;
                Some(GestureIntent::Pinch {
                    zoom: clamp_zoom(start_zoom * scale),
                })
            }
            (_, [a, b, ..]) => {
                // Second finger joined mid-gesture
                self.last_tap = None;
                self.tracking = Self::pinch_from(*a, *b, view.zoom);
                None
            }
            _ => None,
        }
    }

    fn end(&mut self, event: &TouchEvent) -> Option<GestureIntent> {
        let tracking = std::mem::take(&mut self.tracking);
        let Tracking::OneFinger {
            start,
            last,
            started_at,
            panning,
            ..
        } = tracking
        else {
            return None;
        };

        let end = event.touches.first().copied().unwrap_or(last);
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let held = event.at.saturating_sub(started_at);

        if held <= TAP_MAX_DURATION && start.distance_to(end) <= TAP_MAX_MOVEMENT {
            return self.register_tap(event.at);
        }
        self.last_tap = None;

        if !panning && dx.abs() > SWIPE_THRESHOLD && dx.abs() > dy.abs() {
            let direction = if dx < 0.0 {
                SwipeDirection::Left
            } else {
                SwipeDirection::Right
            };
            return Some(GestureIntent::Swipe(direction));
        }
        None
    }

    fn register_tap(&mut self, at: Duration) -> Option<GestureIntent> {
        match self.last_tap {
            Some(previous) if at.saturating_sub(previous) <= DOUBLE_TAP_WINDOW => {
                self.last_tap = None;
                Some(GestureIntent::ToggleZoom)
            }
            _ => {
                self.last_tap = Some(at);
                None
            }
        }
    }

    fn pinch_from(a: TouchPoint, b: TouchPoint, zoom: f32) -> Tracking {
        let start_distance = a.distance_to(b);
        if start_distance < MIN_PINCH_DISTANCE {
            Tracking::Idle
        } else {
            Tracking::Pinch {
                start_distance,
                start_zoom: zoom,
            }
        }
    }
}
