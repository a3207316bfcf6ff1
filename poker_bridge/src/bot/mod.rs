//! Automated opponents.
//!
//! A [`HeuristicPolicy`] rates its hand, adjusts for position and then folds,
//! calls or raises according to its [`Personality`]:
//!
//! | difficulty | folds below | raises from | aggression | bluffs |
//! |------------|-------------|-------------|------------|--------|
//! | easy       | 0.08        | 0.20        | 0.5        | never  |
//! | standard   | 0.12        | 0.28        | 1.5        | 15%    |
//! | tag        | 0.18        | 0.33        | 2.5        | 25%    |
//!
//! Every automated seat is wrapped in a [`ThinkingProxy`] so it answers at a
//! human pace and the client can show who is thinking.

pub mod decision;
pub mod models;
pub mod proxy;

pub use decision::{HeuristicPolicy, Tuning};
pub use models::Personality;
pub use proxy::ThinkingProxy;
