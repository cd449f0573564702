pub mod cards;
pub mod patterns;
pub mod round;
pub mod types;

pub use cards::{generate_card, CardPoolError, CardRegistry};
pub use patterns::{evaluate, BaseShapes};
pub use round::{BonusRule, CheckOutcome, RoundError, RoundPhase, RoundState, WinnerRecord};
pub use types::*;
