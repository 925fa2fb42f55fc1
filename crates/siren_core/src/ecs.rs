use bevy_ecs::prelude::Component;
use h3o::LatLng;

/// Unique vehicle identifier within one seeded population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub u32);

/// A simulated vehicle. Positions are fixed for the simulation's duration;
/// only the alert flag changes, and only through an applied classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Vehicle {
    pub id: VehicleId,
    pub alerted: bool,
}

/// Exact geographic position of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Position(pub LatLng);
