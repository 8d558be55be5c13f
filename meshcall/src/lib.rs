pub use meshcall_core::{ConnectionId, RoomKey};

pub mod model {
    pub use meshcall_core::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshcall_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}
