pub mod detection;
pub mod geometry;
pub mod io;
pub mod link;
pub mod system;
pub mod tracking;
