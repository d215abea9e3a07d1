mod event;
mod provider;
pub use event::*;
pub use provider::*;
