pub mod bounds;
pub mod coord;
pub mod math;
pub mod shape;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use coord::*;
pub use shape::*;
