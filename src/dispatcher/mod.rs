pub mod dispatcher;
mod outstanding;
pub use dispatcher::*;
pub use outstanding::Outstanding;
