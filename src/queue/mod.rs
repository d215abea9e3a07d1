mod ordered;
pub use ordered::OrderedQueue;
