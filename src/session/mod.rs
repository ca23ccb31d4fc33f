//! Game sessions, players, and the hand aggregate.
//!
//! Sessions and players are created once and read many times; hands are
//! created lazily when their first action arrives and accumulate board,
//! pot, and winner facts as the hand plays out.

pub mod manager;
pub mod models;

pub use manager::SessionManager;
pub use models::{
    ActionId, Cents, GameSession, Hand, HandId, NewGameSession, Player, PlayerId, SessionId,
    StepNumber,
};
