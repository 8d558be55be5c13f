mod controller;
mod devices;
mod local_track;

pub use controller::*;
pub use devices::*;
pub use local_track::*;
