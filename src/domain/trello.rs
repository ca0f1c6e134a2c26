use crate::error::{PlanitError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Display preferences of an external board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPrefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

/// A board on the external service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrelloBoard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub prefs: BoardPrefs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<TrelloList>>,
}

/// A column on an external board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrelloList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(rename = "idBoard", default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(default)]
    pub cards: Vec<TrelloCard>,
}

/// Label attached to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A card on the external service. Belongs to exactly one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrelloCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(rename = "idList")]
    pub list_id: String,
}

/// A board together with its open lists and their open cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardGraph {
    pub board: TrelloBoard,
    pub lists: Vec<TrelloList>,
}

impl BoardGraph {
    pub fn list(&self, list_id: &str) -> Option<&TrelloList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&TrelloCard> {
        self.lists
            .iter()
            .flat_map(|list| list.cards.iter())
            .find(|card| card.id == card_id)
    }

    /// Resolves the list currently holding a card
    pub fn list_of_card(&self, card_id: &str) -> Option<&str> {
        self.lists
            .iter()
            .find(|list| list.cards.iter().any(|card| card.id == card_id))
            .map(|list| list.id.as_str())
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|list| list.cards.len()).sum()
    }
}

/// Partial card update; only fields that are set are transmitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub list_id: Option<String>,
}

impl CardUpdate {
    /// An update that only changes list membership
    pub fn move_to(list_id: impl Into<String>) -> Self {
        Self {
            list_id: Some(list_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.desc.is_none() && self.due.is_none() && self.list_id.is_none()
    }

    /// Query parameters in the external service's naming
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(desc) = &self.desc {
            params.push(("desc", desc.clone()));
        }
        if let Some(due) = &self.due {
            params.push(("due", format_due(due)));
        }
        if let Some(list_id) = &self.list_id {
            params.push(("idList", list_id.clone()));
        }
        params
    }
}

/// Fields for a card created through an add-card action
#[derive(Debug, Clone, PartialEq)]
pub struct NewCard {
    pub name: String,
    pub desc: Option<String>,
    pub due: Option<DateTime<Utc>>,
}

impl NewCard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: None,
            due: None,
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    /// Rejects blank names before anything goes over the wire
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PlanitError::Validation("Card name is required".to_string()));
        }
        Ok(())
    }

    pub fn to_params(&self, list_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("idList", list_id.to_string()), ("name", self.name.clone())];
        if let Some(desc) = &self.desc {
            params.push(("desc", desc.clone()));
        }
        if let Some(due) = &self.due {
            params.push(("due", format_due(due)));
        }
        params
    }
}

/// Board-level edits: name, description and background preferences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardUpdate {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub background: Option<String>,
    pub background_image: Option<String>,
}

impl BoardUpdate {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(desc) = &self.desc {
            params.push(("desc", desc.clone()));
        }
        if let Some(background) = &self.background {
            params.push(("prefs/background", background.clone()));
        }
        if let Some(image) = &self.background_image {
            params.push(("prefs/backgroundImage", image.clone()));
        }
        params
    }
}

/// Rejects blank list names
pub fn validate_list_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PlanitError::Validation("List name is required".to_string()));
    }
    Ok(())
}

fn format_due(due: &DateTime<Utc>) -> String {
    due.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(id: &str, list_id: &str) -> TrelloCard {
        TrelloCard {
            id: id.to_string(),
            name: format!("Card {}", id),
            desc: String::new(),
            due: None,
            labels: Vec::new(),
            list_id: list_id.to_string(),
        }
    }

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
                TrelloList {
                    id: "L1".to_string(),
                    name: "Todo".to_string(),
                    closed: false,
                    board_id: Some("B1".to_string()),
                    cards: vec![card("C1", "L1"), card("C2", "L1")],
                },
                TrelloList {
                    id: "L2".to_string(),
                    name: "Done".to_string(),
                    closed: false,
                    board_id: Some("B1".to_string()),
                    cards: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_graph_lookups() {
        let graph = graph();
        assert_eq!(graph.list_of_card("C2"), Some("L1"));
        assert_eq!(graph.list_of_card("missing"), None);
        assert_eq!(graph.card("C1").map(|c| c.name.as_str()), Some("Card C1"));
        assert!(graph.list("L2").is_some());
        assert_eq!(graph.card_count(), 2);
    }

    #[test]
    fn test_move_update_only_sets_list() {
        let update = CardUpdate::move_to("L2");
        assert_eq!(update.to_params(), vec![("idList", "L2".to_string())]);
        assert!(!update.is_empty());
        assert!(CardUpdate::default().is_empty());
    }

    #[test]
    fn test_card_update_formats_due() {
        let due = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let update = CardUpdate {
            due: Some(due),
            ..Default::default()
        };
        assert_eq!(
            update.to_params(),
            vec![("due", "2024-03-01T12:00:00.000Z".to_string())]
        );
    }

    #[test]
    fn test_new_card_validation() {
        assert!(NewCard::new("Write docs").validate().is_ok());
        assert!(matches!(
            NewCard::new("   ").validate(),
            Err(PlanitError::Validation(_))
        ));
        assert!(NewCard::new("").validate().is_err());
    }

    #[test]
    fn test_new_card_params() {
        let params = NewCard::new("Ship").with_desc("today").to_params("L1");
        assert_eq!(
            params,
            vec![
                ("idList", "L1".to_string()),
                ("name", "Ship".to_string()),
                ("desc", "today".to_string()),
            ]
        );
    }

    #[test]
    fn test_card_deserialization_from_service_payload() {
        let json = r#"{
            "id": "C9",
            "name": "Review PR",
            "desc": "",
            "due": "2024-05-01T09:30:00.000Z",
            "labels": [{"name": "urgent", "color": "red"}, {"name": "", "color": null}],
            "idList": "L3",
            "pos": 16384
        }"#;

        let card: TrelloCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.list_id, "L3");
        assert_eq!(card.labels.len(), 2);
        assert_eq!(card.labels[0].color.as_deref(), Some("red"));
        assert!(card.labels[1].color.is_none());
        assert!(card.due.is_some());
    }

    #[test]
    fn test_board_deserialization_defaults() {
        let json = r##"{"id": "B1", "name": "Roadmap", "prefs": {"backgroundColor": "#0079bf"}}"##;
        let board: TrelloBoard = serde_json::from_str(json).unwrap();
        assert_eq!(board.prefs.background_color.as_deref(), Some("#0079bf"));
        assert!(board.desc.is_empty());
        assert!(board.lists.is_none());
    }

    #[test]
    fn test_list_name_validation() {
        assert!(validate_list_name("Backlog").is_ok());
        assert!(validate_list_name(" ").is_err());
    }
}
