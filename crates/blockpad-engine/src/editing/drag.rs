//! Drag gestures on block handles.
//!
//! A press only turns into a drag once the pointer has travelled further than
//! the activation threshold, so a plain click on the handle never reorders.
//! On drop the coordinator yields the key sequence implied by the drop
//! position; the session applies it to the store and persists the batch.

use crate::editing::block::BlockKey;

pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Handle pressed, threshold not yet exceeded
    Pressed { key: BlockKey, origin: Point },
    Dragging { key: BlockKey, target: Option<usize> },
}

#[derive(Debug, Clone)]
pub struct DragCoordinator {
    threshold: f64,
    state: DragState,
}

impl DragCoordinator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Key of the block being dragged, once the gesture is active
    pub fn dragged(&self) -> Option<BlockKey> {
        match self.state {
            DragState::Dragging { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn press(&mut self, key: BlockKey, origin: Point) {
        self.state = DragState::Pressed { key, origin };
    }

    /// Pointer moved to `point`; returns whether a drag is active afterwards
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if let DragState::Pressed { key, origin } = self.state
            && origin.distance_to(point) > self.threshold
        {
            log::debug!("drag started for block {key}");
            self.state = DragState::Dragging { key, target: None };
        }
        self.is_dragging()
    }

    /// The pointer is over the slot at `index` in the current list
    pub fn hover(&mut self, index: usize) {
        if let DragState::Dragging { target, .. } = &mut self.state {
            *target = Some(index);
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Finish the gesture.
    ///
    /// Returns the new key sequence when an active drag ends over a slot
    /// different from where the block started; a click or a drop in place
    /// yields `None`.
    pub fn drop(&mut self, current: &[BlockKey]) -> Option<Vec<BlockKey>> {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging {
            key,
            target: Some(target),
        } = state
        else {
            return None;
        };
        move_key(current, key, target)
    }
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD_PX)
    }
}

/// Sequence with `key` moved to `to`, or `None` if nothing would change
pub fn move_key(current: &[BlockKey], key: BlockKey, to: usize) -> Option<Vec<BlockKey>> {
    let from = current.iter().position(|k| *k == key)?;
    let to = to.min(current.len().saturating_sub(1));
    if from == to {
        return None;
    }
    let mut sequence = current.to_vec();
    let moved = sequence.remove(from);
    sequence.insert(to, moved);
    Some(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(n: usize) -> Vec<BlockKey> {
        (0..n).map(|_| BlockKey::provisional()).collect()
    }

    #[test]
    fn test_click_without_movement_is_not_a_drag() {
        let keys = keys(3);
        let mut drag = DragCoordinator::default();
        drag.press(keys[2], Point::new(0.0, 0.0));
        assert!(!drag.pointer_move(Point::new(3.0, 4.0)));
        drag.hover(0);
        assert_eq!(drag.drop(&keys), None);
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_drag_past_threshold_moves_block() {
        let keys = keys(3);
        let mut drag = DragCoordinator::default();
        drag.press(keys[2], Point::new(0.0, 100.0));
        assert!(drag.pointer_move(Point::new(0.0, 90.0)));
        assert_eq!(drag.dragged(), Some(keys[2]));
        drag.hover(0);

        assert_eq!(drag.drop(&keys), Some(vec![keys[2], keys[0], keys[1]]));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_in_place_is_noop() {
        let keys = keys(3);
        let mut drag = DragCoordinator::new(1.0);
        drag.press(keys[1], Point::default());
        drag.pointer_move(Point::new(0.0, 5.0));
        drag.hover(1);
        assert_eq!(drag.drop(&keys), None);
    }

    #[test]
    fn test_move_key_clamps_target() {
        let keys = keys(3);
        assert_eq!(
            move_key(&keys, keys[0], 10),
            Some(vec![keys[1], keys[2], keys[0]])
        );
        assert_eq!(move_key(&keys, BlockKey::provisional(), 0), None);
    }

    #[test]
    fn test_cancel_resets() {
        let keys = keys(2);
        let mut drag = DragCoordinator::default();
        drag.press(keys[0], Point::default());
        drag.pointer_move(Point::new(20.0, 0.0));
        drag.cancel();
        assert!(!drag.is_dragging());
    }
}
