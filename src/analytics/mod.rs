pub mod global;
pub mod manager;
pub mod sink;

pub use manager::ViewTracker;
pub use sink::ViewSink;
