pub mod animator;
pub mod clock;
pub mod controller;
pub mod ecs;
pub mod geo;
pub mod population;
pub mod proximity;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
