pub mod light;
pub mod occluder;
pub mod tilemap;
