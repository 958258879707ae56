pub mod gravity;
pub mod grid;
