//! Falling-block puzzle engine.
//!
//! The library holds the rules only: grid, pieces, movement, row clearing,
//! scoring and level progression. Drawing and input live in the binary.

pub mod config;
pub mod engine;
pub mod grid;
pub mod piece;
pub mod session;

pub use config::{CollisionMode, EngineConfig, GravityCurve, LevelMode, Profile, RotationMode};
pub use engine::{Engine, GameEvent};
pub use grid::{Cell, ColorId, Grid, GridError};
pub use piece::{Piece, PieceSource, RandomPieceSource, SequencePieceSource, Shape};
pub use session::SessionManager;
