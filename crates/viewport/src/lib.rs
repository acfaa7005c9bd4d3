//! Zoom bookkeeping across the national and global tile pyramids, and
//! fitting a viewport around drawn or loaded geometry.

pub mod fit;
pub mod pyramid;
pub mod zoom;

pub use fit::*;
pub use pyramid::*;
pub use zoom::*;
