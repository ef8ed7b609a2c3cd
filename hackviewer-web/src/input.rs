/// Pointer position in client (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Host element bounds in client coordinates, read at event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ViewportRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Edges count as inside.
    pub fn contains(&self, pos: PointerPos) -> bool {
        pos.x >= self.left && pos.x <= self.right && pos.y >= self.top && pos.y <= self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { last: PointerPos },
}

/// Turns global mouse events into drag deltas. A drag can only start inside
/// the viewer, but once started it follows the pointer anywhere until release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragTracker {
    state: DragState,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Returns whether the press started (or re-anchored) a drag.
    pub fn pointer_down(&mut self, pos: PointerPos, bounds: &ViewportRect) -> bool {
        if bounds.contains(pos) {
            self.state = DragState::Dragging { last: pos };
            true
        } else {
            false
        }
    }

    /// Delta `(dx, dy)` since the last recorded position, or `None` when idle.
    pub fn pointer_move(&mut self, pos: PointerPos) -> Option<(f64, f64)> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { last } => {
                self.state = DragState::Dragging { last: pos };
                Some((pos.x - last.x, pos.y - last.y))
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> ViewportRect {
        ViewportRect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = rect();
        assert!(r.contains(PointerPos::new(0.0, 0.0)));
        assert!(r.contains(PointerPos::new(800.0, 600.0)));
        assert!(!r.contains(PointerPos::new(800.1, 10.0)));
        assert!(!r.contains(PointerPos::new(10.0, -0.1)));
    }

    #[test]
    fn test_press_outside_stays_idle() {
        let mut drag = DragTracker::new();
        assert!(!drag.pointer_down(PointerPos::new(900.0, 10.0), &rect()));
        assert!(!drag.is_dragging());
        assert_eq!(drag.pointer_move(PointerPos::new(950.0, 20.0)), None);
    }

    #[test]
    fn test_drag_deltas_follow_last_position() {
        let mut drag = DragTracker::new();
        drag.pointer_down(PointerPos::new(100.0, 100.0), &rect());
        assert_eq!(drag.pointer_move(PointerPos::new(110.0, 95.0)), Some((10.0, -5.0)));
        assert_eq!(drag.pointer_move(PointerPos::new(130.0, 95.0)), Some((20.0, 0.0)));
    }

    #[test]
    fn test_drag_continues_outside_bounds() {
        let mut drag = DragTracker::new();
        drag.pointer_down(PointerPos::new(790.0, 300.0), &rect());
        assert_eq!(drag.pointer_move(PointerPos::new(1000.0, 300.0)), Some((210.0, 0.0)));
    }

    #[test]
    fn test_release_anywhere_ends_drag() {
        let mut drag = DragTracker::new();
        drag.pointer_down(PointerPos::new(10.0, 10.0), &rect());
        drag.pointer_up();
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.pointer_move(PointerPos::new(20.0, 20.0)), None);
    }

    #[test]
    fn test_second_press_reanchors() {
        let mut drag = DragTracker::new();
        drag.pointer_down(PointerPos::new(10.0, 10.0), &rect());
        drag.pointer_down(PointerPos::new(50.0, 50.0), &rect());
        assert_eq!(drag.pointer_move(PointerPos::new(51.0, 50.0)), Some((1.0, 0.0)));
    }
}
