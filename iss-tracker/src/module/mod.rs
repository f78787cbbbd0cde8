pub mod map;
pub mod renderer;
