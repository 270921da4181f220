pub mod geometry;
pub mod visibility;
pub mod pool;
pub mod time;
