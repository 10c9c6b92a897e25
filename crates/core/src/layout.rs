//! Swimlane grid geometry and the card drag/resize gesture.
//!
//! [`GridLayout`] maps the visible dates onto fixed-width pixel columns and
//! positions allocation cards on them. [`Gesture`] is the pointer state
//! machine for moving and resizing a card; it is driven by explicit
//! [`PointerEvent`]s and emits at most one [`AllocationChanged`] per gesture.

use chrono::NaiveDate;

use crate::types::RecordId;

// ---------------------------------------------------------------------------
// Column geometry
// ---------------------------------------------------------------------------

/// Share of the available width given to the date columns.
pub const USABLE_WIDTH_RATIO: f64 = 0.8;

/// Columns never shrink below this many pixels.
pub const MIN_COLUMN_WIDTH: f64 = 48.0;

/// Width of one date column: `max(available * 0.8 / count, minimum)`.
///
/// Zero columns yield `minimum`.
pub fn column_width(available_width: f64, column_count: usize, minimum: f64) -> f64 {
    if column_count == 0 {
        return minimum;
    }
    (available_width * USABLE_WIDTH_RATIO / column_count as f64).max(minimum)
}

/// Pixel placement of a card inside its row. Height is always the full row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRect {
    pub left: f64,
    pub width: f64,
    pub first_column: usize,
    pub span: usize,
}

/// Visible columns of the swimlane and their pixel width.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    dates: Vec<NaiveDate>,
    column_width: f64,
}

impl GridLayout {
    /// `dates` must be ascending (as produced by
    /// [`build_date_range`](crate::swimlane::build_date_range)).
    pub fn new(dates: Vec<NaiveDate>, available_width: f64) -> Self {
        let column_width = column_width(available_width, dates.len(), MIN_COLUMN_WIDTH);
        Self {
            dates,
            column_width,
        }
    }

    /// Recompute the column width after a viewport resize.
    pub fn resize(&mut self, available_width: f64) {
        self.column_width = column_width(available_width, self.dates.len(), MIN_COLUMN_WIDTH);
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_width(&self) -> f64 {
        self.column_width
    }

    pub fn column_count(&self) -> usize {
        self.dates.len()
    }

    pub fn total_width(&self) -> f64 {
        self.column_width * self.dates.len() as f64
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Date under a pixel offset from the left edge of the first column.
    pub fn date_at(&self, x: f64) -> Option<NaiveDate> {
        if x < 0.0 || self.column_width <= 0.0 {
            return None;
        }
        let index = (x / self.column_width).floor() as usize;
        self.dates.get(index).copied()
    }

    /// Whole columns covered by a horizontal pointer delta, rounded to the
    /// nearest column.
    pub fn columns_for_delta(&self, delta_x: f64) -> i64 {
        if self.column_width <= 0.0 {
            return 0;
        }
        (delta_x / self.column_width).round() as i64
    }

    /// Place a card for an inclusive date range, clipped to the visible
    /// columns. `None` when no visible column falls inside the range.
    pub fn place(&self, start: NaiveDate, end: NaiveDate) -> Option<CardRect> {
        let first = self.dates.partition_point(|d| *d < start);
        let past_last = self.dates.partition_point(|d| *d <= end);
        if first >= past_last {
            return None;
        }
        let span = past_last - first;
        Some(CardRect {
            left: first as f64 * self.column_width,
            width: span as f64 * self.column_width,
            first_column: first,
            span,
        })
    }

    /// Move `date` by `offset` visible columns, skipping hidden days.
    ///
    /// A date on a hidden day first snaps to the next visible column when
    /// `round_up`, otherwise to the previous one. `None` when `date` or the
    /// result lies outside the visible columns.
    pub fn shift_by_columns(&self, date: NaiveDate, offset: i64, round_up: bool) -> Option<NaiveDate> {
        if !self.contains_range(date, date) {
            return None;
        }
        let index = if round_up {
            self.dates.partition_point(|d| *d < date)
        } else {
            self.dates.partition_point(|d| *d <= date).checked_sub(1)?
        };
        let target = i64::try_from(index).ok()?.checked_add(offset)?;
        let target = usize::try_from(target).ok()?;
        self.dates.get(target).copied()
    }

    /// Whether an inclusive range lies within the first and last visible date.
    pub fn contains_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => start >= first && end <= last,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Gesture state machine
// ---------------------------------------------------------------------------

/// Card edge moved by a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Moves the start date.
    Left,
    /// Moves the end date.
    Right,
}

/// Resize handles rendered around a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Left,
    Right,
    /// Disabled: a card always fills its row.
    Top,
    /// Disabled: a card always fills its row.
    Bottom,
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Body,
    Handle(Handle),
}

/// The allocation a gesture operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRange {
    pub allocation_id: RecordId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Pointer input, in pixels along the grid's horizontal axis.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        x: f64,
        target: PointerTarget,
        card: CardRange,
    },
    Move {
        x: f64,
    },
    Up {
        x: f64,
    },
}

/// Emitted once when a drag or resize completes with a new, valid range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationChanged {
    pub allocation_id: RecordId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        card: CardRange,
        origin_x: f64,
        current_x: f64,
    },
    Resizing {
        card: CardRange,
        edge: Edge,
        origin_x: f64,
        current_x: f64,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Advance the state machine by one pointer event.
    ///
    /// Returns the next state and, on a successful pointer-up, the change to
    /// persist. Rejected gestures return to [`Gesture::Idle`] without an
    /// event.
    pub fn handle(
        self,
        event: PointerEvent,
        grid: &GridLayout,
    ) -> (Gesture, Option<AllocationChanged>) {
        match (self, event) {
            (Gesture::Idle, PointerEvent::Down { x, target, card }) => {
                let next = match target {
                    PointerTarget::Body => Gesture::Dragging {
                        card,
                        origin_x: x,
                        current_x: x,
                    },
                    PointerTarget::Handle(Handle::Left) => Gesture::Resizing {
                        card,
                        edge: Edge::Left,
                        origin_x: x,
                        current_x: x,
                    },
                    PointerTarget::Handle(Handle::Right) => Gesture::Resizing {
                        card,
                        edge: Edge::Right,
                        origin_x: x,
                        current_x: x,
                    },
                    PointerTarget::Handle(Handle::Top | Handle::Bottom) => Gesture::Idle,
                };
                (next, None)
            }
            (Gesture::Idle, _) => (Gesture::Idle, None),

            // A second pointer-down mid-gesture is ignored.
            (active, PointerEvent::Down { .. }) => (active, None),

            (active, PointerEvent::Move { x }) => (active.with_current_x(x), None),

            (active, PointerEvent::Up { x }) => {
                let active = active.with_current_x(x);
                let change = active.proposal(grid).map(|(card, start, end)| AllocationChanged {
                    allocation_id: card.allocation_id.clone(),
                    start,
                    end,
                });
                (Gesture::Idle, change)
            }
        }
    }

    /// Range the card would take if the pointer were released now, or `None`
    /// when idle or when the release would be rejected.
    pub fn preview(&self, grid: &GridLayout) -> Option<(NaiveDate, NaiveDate)> {
        self.proposal(grid).map(|(_, start, end)| (start, end))
    }

    fn with_current_x(self, x: f64) -> Gesture {
        match self {
            Gesture::Idle => Gesture::Idle,
            Gesture::Dragging { card, origin_x, .. } => Gesture::Dragging {
                card,
                origin_x,
                current_x: x,
            },
            Gesture::Resizing {
                card,
                edge,
                origin_x,
                ..
            } => Gesture::Resizing {
                card,
                edge,
                origin_x,
                current_x: x,
            },
        }
    }

    /// Candidate range for the current pointer position after the rejection
    /// rules: the moved edge must change, the range must stay ordered and
    /// inside the visible columns. Offsets count visible columns, so a card
    /// never lands on a hidden day.
    fn proposal(&self, grid: &GridLayout) -> Option<(&CardRange, NaiveDate, NaiveDate)> {
        let (card, edge, origin_x, current_x) = match self {
            Gesture::Idle => return None,
            Gesture::Dragging {
                card,
                origin_x,
                current_x,
            } => (card, None, *origin_x, *current_x),
            Gesture::Resizing {
                card,
                edge,
                origin_x,
                current_x,
            } => (card, Some(*edge), *origin_x, *current_x),
        };

        let offset = grid.columns_for_delta(current_x - origin_x);
        if offset == 0 {
            return None;
        }
        let shift_start = || grid.shift_by_columns(card.start, offset, true);
        let shift_end = || grid.shift_by_columns(card.end, offset, false);

        let (start, end) = match edge {
            None => (shift_start()?, shift_end()?),
            Some(Edge::Left) => (shift_start()?, card.end),
            Some(Edge::Right) => (card.start, shift_end()?),
        };

        if start > end || !grid.contains_range(start, end) {
            return None;
        }
        Some((card, start, end))
    }
}
