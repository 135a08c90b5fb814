//! Platform abstraction layer
//!
//! The host translates its native events into [`InputEvent`]s; the game
//! folds them into [`InputState`] and hands a [`TickInput`] to each tick.
//!
//! [`TickInput`]: crate::sim::TickInput

pub mod input;

pub use input::{InputEvent, InputState, Key, MouseButton};
