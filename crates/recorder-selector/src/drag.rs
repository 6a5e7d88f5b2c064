//! Region selection by mouse drag.

use recorder_ipc::Region;
use tracing::debug;

use crate::MIN_SELECTION_SIZE;

/// Where a drag selection currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Waiting for a button press.
    Listening,
    /// Button held, rubber band follows the cursor.
    Dragging {
        anchor: (i32, i32),
        cursor: (i32, i32),
    },
    /// Button released over a large-enough rectangle.
    Pending { rect: Region },
}

/// Tracks a press-drag-release region selection.
///
/// Input coordinates are relative to the selection overlay, which spans the
/// whole virtual desktop; `confirm` translates the chosen rectangle by the
/// overlay origin so regions on a monitor left of or above the primary keep
/// their negative desktop coordinates.
#[derive(Debug)]
pub struct RegionDrag {
    phase: DragPhase,
    origin: (i32, i32),
}

impl RegionDrag {
    /// Create a selector for an overlay whose top-left corner sits at
    /// `origin` in desktop coordinates.
    pub fn new(origin: (i32, i32)) -> Self {
        Self {
            phase: DragPhase::Listening,
            origin,
        }
    }

    /// Button press at `(x, y)`. Starts a fresh drag, discarding any
    /// pending selection.
    pub fn press(&mut self, x: i32, y: i32) {
        self.phase = DragPhase::Dragging {
            anchor: (x, y),
            cursor: (x, y),
        };
    }

    /// Cursor moved to `(x, y)`. Ignored unless a drag is in progress.
    pub fn motion(&mut self, x: i32, y: i32) {
        if let DragPhase::Dragging { anchor, .. } = self.phase {
            self.phase = DragPhase::Dragging {
                anchor,
                cursor: (x, y),
            };
        }
    }

    /// Button released at `(x, y)`. Returns the selected rectangle in
    /// overlay coordinates, or `None` if no drag was in progress or the
    /// rectangle is under the minimum size, in which case the selector
    /// goes back to listening for the next drag.
    pub fn release(&mut self, x: i32, y: i32) -> Option<Region> {
        let anchor = match self.phase {
            DragPhase::Dragging { anchor, .. } => anchor,
            _ => return None,
        };

        let rect = Region::from_corners(anchor, (x, y));
        if rect.width < MIN_SELECTION_SIZE || rect.height < MIN_SELECTION_SIZE {
            debug!(
                width = rect.width,
                height = rect.height,
                "Selection below minimum size, ignoring"
            );
            self.phase = DragPhase::Listening;
            return None;
        }

        self.phase = DragPhase::Pending { rect };
        Some(rect)
    }

    /// Rectangle to draw as feedback: the rubber band while dragging, the
    /// selection once released.
    pub fn preview(&self) -> Option<Region> {
        match self.phase {
            DragPhase::Listening => None,
            DragPhase::Dragging { anchor, cursor } => Some(Region::from_corners(anchor, cursor)),
            DragPhase::Pending { rect } => Some(rect),
        }
    }

    /// Final selection in desktop coordinates, if one is pending.
    pub fn confirm(&self) -> Option<Region> {
        match self.phase {
            DragPhase::Pending { rect } => Some(rect.translated(self.origin.0, self.origin.1)),
            _ => None,
        }
    }

    /// Abandon the current drag or pending selection.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Listening;
    }

    pub fn has_selection(&self) -> bool {
        matches!(self.phase, DragPhase::Pending { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }
}
