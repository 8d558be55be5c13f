mod engine;
mod error;
mod media;
mod membership;
mod session;
mod signal;
mod transport;

pub use engine::*;
pub use error::*;
pub use media::*;
pub use membership::*;
pub use session::*;
pub use signal::*;
pub use transport::*;
