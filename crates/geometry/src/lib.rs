//! Geometry rules applied before anything enters the drawing model.

pub mod grid;
pub mod winding;

pub use grid::*;
pub use winding::*;
