pub mod alerts;
pub mod movement;
