//! Pointer gesture state machine for the chart.
//!
//! `Idle → Pressed → Dragging → Idle`. A press inside the plot starts a range
//! selection; a press in the axis band below it (or any move with shift held)
//! pans the time axis instead. Releasing without dragging is a click, which
//! drills into the hovered bar's datasource.
//!
//! While a press is active the controller keeps global move/up listeners
//! subscribed so drags that leave the chart keep being tracked.

use chrono::{DateTime, Duration, Utc};

use super::bucket::{ceil_to_duration, floor_to_duration, BucketDuration};
use super::scale::{ChartScales, TimeScale};
use super::types::DateRange;

/// Registration of the host's pointer move/up handlers
pub trait PointerListeners {
    fn subscribe(&mut self);
    fn unsubscribe(&mut self);
}

/// Pointer position in inner-plot coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &PointerPos) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Select,
    Shift,
}

/// What a drag in progress would commit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingDrag {
    Range(DateRange),
    /// Milliseconds to move the visible range by
    Offset(i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Pressed {
        anchor: DateTime<Utc>,
        mode: DragMode,
        origin: PointerPos,
    },
    Dragging {
        anchor: DateTime<Utc>,
        mode: DragMode,
        pending: PendingDrag,
    },
}

/// Output of the controller
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    RangeChange(DateRange),
    /// `None` clears the drill-down
    DrillDown(Option<String>),
}

/// The bar the pointer currently rests on
#[derive(Debug, Clone, PartialEq)]
pub struct HoveredBar {
    pub index: usize,
    pub datasource: Option<String>,
}

/// Day-aligned range covering both instants
fn select_range(a: DateTime<Utc>, b: DateTime<Utc>) -> DateRange {
    let start = floor_to_duration(a.min(b), BucketDuration::Day);
    let mut end = ceil_to_duration(a.max(b), BucketDuration::Day);
    if end <= start {
        end = start + Duration::days(1);
    }
    DateRange::new(start, end)
}

pub struct GestureController<L: PointerListeners> {
    listeners: L,
    subscribed: bool,
    state: GestureState,
    hovered: Option<HoveredBar>,
    drag_threshold_px: f64,
}

impl<L: PointerListeners> GestureController<L> {
    pub fn new(listeners: L, drag_threshold_px: f64) -> Self {
        Self {
            listeners,
            subscribed: false,
            state: GestureState::Idle,
            hovered: None,
            drag_threshold_px: drag_threshold_px.max(0.0),
        }
    }

    pub fn listeners(&self) -> &L {
        &self.listeners
    }

    pub fn set_drag_threshold(&mut self, px: f64) {
        self.drag_threshold_px = px.max(0.0);
    }

    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn pending(&self) -> Option<PendingDrag> {
        match self.state {
            GestureState::Dragging { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// Selection window to shade while a select drag is in progress
    pub fn pending_range(&self) -> Option<DateRange> {
        match self.pending() {
            Some(PendingDrag::Range(range)) => Some(range),
            _ => None,
        }
    }

    /// The time scale to draw with: `base` panned live during a shift drag
    pub fn display_time_scale(&self, base: &TimeScale) -> TimeScale {
        match self.pending() {
            Some(PendingDrag::Offset(offset)) => base.shifted(offset),
            _ => *base,
        }
    }

    pub fn hovered(&self) -> Option<&HoveredBar> {
        self.hovered.as_ref()
    }

    /// Update the hovered bar; ignored while dragging
    pub fn hover(&mut self, bar: Option<HoveredBar>) {
        if self.is_dragging() {
            return;
        }
        self.hovered = bar;
    }

    /// Pointer left the plotting area
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    pub fn pointer_down(&mut self, pos: PointerPos, scales: &ChartScales) {
        let mode = if pos.y > scales.inner_height {
            DragMode::Shift
        } else {
            DragMode::Select
        };
        self.state = GestureState::Pressed {
            anchor: scales.time.invert(pos.x),
            mode,
            origin: pos,
        };
        if !self.subscribed {
            self.listeners.subscribe();
            self.subscribed = true;
        }
    }

    /// `scales` must be the unshifted scales for the committed range
    pub fn pointer_move(&mut self, pos: PointerPos, shift_key: bool, scales: &ChartScales) {
        let (anchor, mode) = match self.state {
            GestureState::Idle => return,
            GestureState::Pressed { anchor, mode, origin } => {
                if pos.distance(&origin) <= self.drag_threshold_px {
                    return;
                }
                (anchor, mode)
            }
            GestureState::Dragging { anchor, mode, .. } => (anchor, mode),
        };

        // `mode` stays the press mode; the shift key only overrides it while held
        let effective = if shift_key { DragMode::Shift } else { mode };
        let current = scales.time.invert(pos.x);
        let pending = match effective {
            DragMode::Select => PendingDrag::Range(select_range(anchor, current)),
            DragMode::Shift => PendingDrag::Offset((anchor - current).num_milliseconds()),
        };

        self.hovered = None;
        self.state = GestureState::Dragging {
            anchor,
            mode,
            pending,
        };
    }

    /// Finish the gesture. `range` is the committed range the drag started from.
    pub fn pointer_up(&mut self, range: DateRange) -> Option<GestureEvent> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        self.release();

        match state {
            GestureState::Idle => None,
            GestureState::Pressed { .. } => self
                .hovered
                .as_ref()
                .and_then(|bar| bar.datasource.clone())
                .map(|ds| GestureEvent::DrillDown(Some(ds))),
            GestureState::Dragging { pending, .. } => {
                let committed = match pending {
                    PendingDrag::Range(selected) => selected,
                    PendingDrag::Offset(offset) => range.shifted(offset),
                };
                tracing::debug!("Gesture committed range {:?}", committed);
                Some(GestureEvent::RangeChange(committed))
            }
        }
    }

    /// The "show all" control
    pub fn show_all(&self) -> GestureEvent {
        GestureEvent::DrillDown(None)
    }

    fn release(&mut self) {
        if self.subscribed {
            self.listeners.unsubscribe();
            self.subscribed = false;
        }
    }
}

impl<L: PointerListeners> Drop for GestureController<L> {
    fn drop(&mut self) {
        self.release();
    }
}
