// Re-export glam for convenience
pub use glam::*;

// Prism math types
mod frame;
mod ray;
pub use frame::Frame;
pub use ray::Ray;
