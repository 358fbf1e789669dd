//! Sensor filtering and game piece detection
pub mod filters;
pub mod game_pieces;
pub mod sensors;

pub use filters::{Debouncer, FallingEdge, Filter, RisingEdge};
pub use sensors::{DebouncedBallSensor, ProximitySensor, Reading};
