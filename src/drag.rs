//! Pointer-drag state machine for moving cards between lists.
//!
//! Turns a stream of pointer events into at most one discrete move intent.
//! A press becomes a drag only after the pointer travels past
//! [`ACTIVATION_DISTANCE`]; shorter gestures are clicks that open the card.
//! Only list membership is resolved here. Where a card lands inside a list
//! is visual and never produces a request.

use crate::domain::BoardGraph;
use std::collections::HashSet;
use tracing::debug;

/// Pointer travel required before a press turns into a drag
pub const ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What the pointer is hovering over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A list body, the only target an empty list offers
    List(String),
    /// Another card; its owning list is the real target
    Card(String),
}

/// A resolved request to change a card's list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub card_id: String,
    pub from_list: String,
    pub to_list: String,
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released before the activation distance: open the card
    Click(String),
    /// Dropped in the list it came from
    Unchanged,
    /// Dropped nowhere, or on something no longer on the board
    Cancelled,
    Move(MoveIntent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Pressed {
        card_id: String,
        origin: Point,
    },
    Dragging {
        card_id: String,
        source_list: String,
        over: Option<DropTarget>,
    },
}

#[derive(Debug)]
pub struct DragController {
    state: DragState,
    editing: HashSet<String>,
    activation_distance: f64,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            editing: HashSet::new(),
            activation_distance: ACTIVATION_DISTANCE,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Marks a card as open in an editor; editing cards cannot be dragged
    pub fn set_editing(&mut self, card_id: &str, editing: bool) {
        if editing {
            self.editing.insert(card_id.to_string());
            if self.active_card() == Some(card_id) {
                debug!(card_id, "drag cancelled, card opened for editing");
                self.state = DragState::Idle;
            }
        } else {
            self.editing.remove(card_id);
        }
    }

    pub fn is_editing(&self, card_id: &str) -> bool {
        self.editing.contains(card_id)
    }

    /// Returns false when the press is ignored
    pub fn pointer_down(&mut self, card_id: &str, at: Point) -> bool {
        if self.is_editing(card_id) {
            return false;
        }
        self.state = DragState::Pressed {
            card_id: card_id.to_string(),
            origin: at,
        };
        true
    }

    /// Returns true when this move activated the drag
    pub fn pointer_move(&mut self, at: Point, graph: &BoardGraph) -> bool {
        let DragState::Pressed { card_id, origin } = &self.state else {
            return false;
        };
        if origin.distance_to(&at) <= self.activation_distance {
            return false;
        }

        match graph.list_of_card(card_id) {
            Some(source_list) => {
                debug!(card_id = %card_id, source_list, "drag started");
                self.state = DragState::Dragging {
                    card_id: card_id.clone(),
                    source_list: source_list.to_string(),
                    over: None,
                };
                true
            }
            None => {
                // The card vanished in a refetch while pressed
                self.state = DragState::Idle;
                false
            }
        }
    }

    pub fn drag_over(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging { over, .. } = &mut self.state {
            *over = target;
        }
    }

    pub fn pointer_up(&mut self, graph: &BoardGraph) -> DropOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Idle => DropOutcome::Cancelled,
            DragState::Pressed { card_id, .. } => DropOutcome::Click(card_id),
            DragState::Dragging {
                card_id,
                source_list,
                over,
            } => {
                let Some(to_list) = over.and_then(|target| resolve_target(&target, graph)) else {
                    return DropOutcome::Cancelled;
                };
                if to_list == source_list {
                    return DropOutcome::Unchanged;
                }
                debug!(card_id = %card_id, from = %source_list, to = %to_list, "drop resolved");
                DropOutcome::Move(MoveIntent {
                    card_id,
                    from_list: source_list,
                    to_list,
                })
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    fn active_card(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Pressed { card_id, .. } | DragState::Dragging { card_id, .. } => {
                Some(card_id)
            }
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a hovered target to the list it stands for
fn resolve_target(target: &DropTarget, graph: &BoardGraph) -> Option<String> {
    match target {
        DropTarget::List(list_id) => graph.list(list_id).map(|l| l.id.clone()),
        DropTarget::Card(card_id) => graph.list_of_card(card_id).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardPrefs, TrelloBoard, TrelloCard, TrelloList};

    fn card(id: &str, list_id: &str) -> TrelloCard {
        TrelloCard {
            id: id.to_string(),
            name: id.to_string(),
            desc: String::new(),
            due: None,
            labels: Vec::new(),
            list_id: list_id.to_string(),
        }
    }

    fn list(id: &str, cards: Vec<TrelloCard>) -> TrelloList {
        TrelloList {
            id: id.to_string(),
            name: id.to_string(),
            closed: false,
            board_id: Some("B1".to_string()),
            cards,
        }
    }

    /// L1 [C1, C2], L2 [C3], L3 []
    fn graph() -> BoardGraph {
        BoardGraph {
            board: TrelloBoard {
                id: "B1".to_string(),
                name: "Board".to_string(),
                desc: String::new(),
                url: String::new(),
                prefs: BoardPrefs::default(),
                lists: None,
            },
            lists: vec![
                list("L1", vec![card("C1", "L1"), card("C2", "L1")]),
                list("L2", vec![card("C3", "L2")]),
                list("L3", Vec::new()),
            ],
        }
    }

    fn start_drag(controller: &mut DragController, card_id: &str, graph: &BoardGraph) {
        assert!(controller.pointer_down(card_id, Point::new(0.0, 0.0)));
        assert!(controller.pointer_move(Point::new(20.0, 0.0), graph));
    }

    #[test]
    fn test_short_travel_is_a_click() {
        let graph = graph();
        let mut controller = DragController::new();

        controller.pointer_down("C1", Point::new(10.0, 10.0));
        assert!(!controller.pointer_move(Point::new(15.0, 15.0), &graph));
        assert!(!controller.is_dragging());

        assert_eq!(
            controller.pointer_up(&graph),
            DropOutcome::Click("C1".to_string())
        );
    }

    #[test]
    fn test_exactly_threshold_does_not_activate() {
        let graph = graph();
        let mut controller = DragController::new();
        controller.pointer_down("C1", Point::new(0.0, 0.0));

        assert!(!controller.pointer_move(Point::new(8.0, 0.0), &graph));
        assert!(controller.pointer_move(Point::new(8.1, 0.0), &graph));
    }

    #[test]
    fn test_drop_on_empty_list_moves() {
        let graph = graph();
        let mut controller = DragController::new();
        start_drag(&mut controller, "C1", &graph);

        controller.drag_over(Some(DropTarget::List("L3".to_string())));
        assert_eq!(
            controller.pointer_up(&graph),
            DropOutcome::Move(MoveIntent {
                card_id: "C1".to_string(),
                from_list: "L1".to_string(),
                to_list: "L3".to_string(),
            })
        );
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_drop_on_card_resolves_owning_list() {
        let graph = graph();
        let mut controller = DragController::new();
        start_drag(&mut controller, "C2", &graph);

        controller.drag_over(Some(DropTarget::Card("C3".to_string())));
        match controller.pointer_up(&graph) {
            DropOutcome::Move(intent) => assert_eq!(intent.to_list, "L2"),
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn test_drop_within_same_list_is_unchanged() {
        let graph = graph();
        let mut controller = DragController::new();
        start_drag(&mut controller, "C1", &graph);

        controller.drag_over(Some(DropTarget::Card("C2".to_string())));
        assert_eq!(controller.pointer_up(&graph), DropOutcome::Unchanged);

        start_drag(&mut controller, "C1", &graph);
        controller.drag_over(Some(DropTarget::List("L1".to_string())));
        assert_eq!(controller.pointer_up(&graph), DropOutcome::Unchanged);
    }

    #[test]
    fn test_drop_without_target_cancels() {
        let graph = graph();
        let mut controller = DragController::new();
        start_drag(&mut controller, "C1", &graph);

        controller.drag_over(Some(DropTarget::List("L2".to_string())));
        controller.drag_over(None);
        assert_eq!(controller.pointer_up(&graph), DropOutcome::Cancelled);

        start_drag(&mut controller, "C1", &graph);
        controller.drag_over(Some(DropTarget::List("gone".to_string())));
        assert_eq!(controller.pointer_up(&graph), DropOutcome::Cancelled);
    }

    #[test]
    fn test_editing_card_cannot_be_dragged() {
        let graph = graph();
        let mut controller = DragController::new();
        controller.set_editing("C1", true);

        assert!(!controller.pointer_down("C1", Point::new(0.0, 0.0)));
        assert!(!controller.pointer_move(Point::new(50.0, 0.0), &graph));
        assert_eq!(controller.state(), &DragState::Idle);

        controller.set_editing("C1", false);
        assert!(controller.pointer_down("C1", Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_opening_editor_cancels_active_drag() {
        let graph = graph();
        let mut controller = DragController::new();
        start_drag(&mut controller, "C3", &graph);

        controller.set_editing("C3", true);
        assert!(!controller.is_dragging());
        assert_eq!(controller.pointer_up(&graph), DropOutcome::Cancelled);
    }
}
