mod event;
mod mirror;
mod profile;
mod session;

pub use event::*;
pub use mirror::*;
pub use profile::*;
pub use session::*;
