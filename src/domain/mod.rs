pub mod auth;
pub mod board;
pub mod trello;

pub use auth::{AuthResponse, LoginPayload, RegisterPayload, UserProfile};
pub use board::{
    BoardCard, BoardDetail, BoardList, BoardMember, BoardSummary, CreateBoardPayload, MemberRole,
    UpdateBoardPayload,
};
pub use trello::{
    BoardGraph, BoardPrefs, BoardUpdate, CardUpdate, Label, NewCard, TrelloBoard, TrelloCard,
    TrelloList,
};
