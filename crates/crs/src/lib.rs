pub mod convert;
pub mod detect;
pub mod registry;

pub use convert::*;
pub use detect::*;
pub use registry::*;
