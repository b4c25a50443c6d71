//! Core data types: channel/side enums, canonical market events, and the raw
//! message wrapper handed from the transports to the dispatcher.

pub mod enums;
pub mod events;
pub mod raw;

pub use enums::*;
pub use events::*;
pub use raw::*;
