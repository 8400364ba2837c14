//! Collaborators at the edge of the core: surfaces, files, choosers, engine.

pub mod chooser;
pub mod engine;
pub mod fs;
pub mod surface;
