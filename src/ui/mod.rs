/// Terminal front end: key mapping and the diff renderer.

pub mod input;
pub mod renderer;
