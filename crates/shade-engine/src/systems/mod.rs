pub mod rng;
pub mod falloff;
pub mod mask;
pub mod compositor;
pub mod lighting;
