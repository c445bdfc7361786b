pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece colliding when setting falling piece")]
pub struct PieceCollisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("piece colliding when holding piece")]
    PieceCollision(PieceCollisionError),
    #[display("hold already used in this turn")]
    HoldAlreadyUsed,
}

/// Why a player input was refused. A refused input changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ActionError {
    #[display("session is not in play")]
    NotPlaying,
    #[display("piece colliding")]
    #[from]
    Collision(PieceCollisionError),
    #[display("hold already used in this turn")]
    HoldAlreadyUsed,
    #[display("power-up denied: {_0}")]
    #[from]
    Denied(PowerUpDenied),
}

impl From<HoldError> for ActionError {
    fn from(e: HoldError) -> Self {
        match e {
            HoldError::PieceCollision(e) => ActionError::Collision(e),
            HoldError::HoldAlreadyUsed => ActionError::HoldAlreadyUsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PauseError {
    #[display("pause was requested by the other side")]
    NotPermitted,
}
