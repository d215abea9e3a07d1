pub mod priority;
pub use priority::*;
pub mod rate_limiter;
pub use rate_limiter::*;
pub mod shutdown;
pub use shutdown::*;
