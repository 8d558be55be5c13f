mod config;
mod room;
mod signaling;

pub use config::*;
pub use room::*;
pub use signaling::*;
