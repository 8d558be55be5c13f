mod signal_sink;
mod ws_client;

pub use signal_sink::*;
pub use ws_client::*;
