mod peer_session;
mod session_table;

pub use peer_session::*;
pub use session_table::*;
