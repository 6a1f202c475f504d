pub mod component_model;
pub mod geometry;
