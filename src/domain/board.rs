use crate::error::{PlanitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a member on a first-party board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "Owner"),
            Self::Admin => write!(f, "Admin"),
            Self::Member => write!(f, "Member"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    pub id: String,
    pub f_name: String,
    pub l_name: String,
    pub email: String,
    pub role: MemberRole,
}

impl BoardMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.f_name, self.l_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub comments_count: Option<u32>,
    #[serde(default)]
    pub attachments_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<BoardCard>,
}

/// Dashboard row for a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub member_count: u32,
    pub list_count: u32,
    pub card_count: u32,
    pub updated_at: String,
}

/// Full board document with members and nested lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDetail {
    #[serde(flatten)]
    pub summary: BoardSummary,
    #[serde(default)]
    pub members: Vec<BoardMember>,
    #[serde(default)]
    pub lists: Vec<BoardList>,
    pub created_at: String,
}

impl BoardDetail {
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    /// Gets the owner of the board, if listed
    pub fn owner(&self) -> Option<&BoardMember> {
        self.members.iter().find(|m| m.role == MemberRole::Owner)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBoardPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CreateBoardPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PlanitError::Validation("Board name is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBoardPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_detail_deserialization() {
        let json = r#"{
            "id": "65f0",
            "name": "Launch",
            "color": "violet",
            "memberCount": 1,
            "listCount": 1,
            "cardCount": 1,
            "updatedAt": "2024-01-02T00:00:00.000Z",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "members": [
                {"id": "u1", "fName": "Ada", "lName": "Lovelace", "email": "ada@example.com", "role": "owner"}
            ],
            "lists": [
                {"id": "l1", "title": "Todo", "cards": [
                    {"id": "c1", "title": "Plan", "labels": ["design"], "dueDate": null, "commentsCount": 0}
                ]}
            ]
        }"#;

        let detail: BoardDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.id(), "65f0");
        assert_eq!(detail.summary.card_count, 1);
        assert_eq!(detail.lists[0].cards[0].labels, vec!["design".to_string()]);
        assert_eq!(detail.owner().map(|m| m.full_name()), Some("Ada Lovelace".to_string()));
    }

    #[test]
    fn test_update_payload_omits_absent_fields() {
        let payload = UpdateBoardPayload {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Renamed"}));
    }

    #[test]
    fn test_create_payload_validation() {
        assert!(CreateBoardPayload::new("Sprint").validate().is_ok());
        assert!(CreateBoardPayload::new("  ").validate().is_err());
    }

    #[test]
    fn test_member_role_serialization() {
        assert_eq!(serde_json::to_string(&MemberRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(MemberRole::Owner.to_string(), "Owner");
    }
}
