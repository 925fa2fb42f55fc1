//! Vehicle population seeding.
//!
//! A population is generated once per route and replaced wholesale on the
//! next cycle. A configurable share of vehicles is snapped to random route
//! waypoints (excluding the last, where the ambulance never passes anyone);
//! the remainder is scattered uniformly across the map bounds. Vehicles do
//! not move afterwards.

use bevy_ecs::prelude::{Entity, With, World};
use rand::Rng;

use crate::ecs::{Position, Vehicle, VehicleId};
use crate::geo::MapBounds;
use crate::routing::Route;

/// Despawn any previous population and spawn exactly `count` vehicles with
/// sequential ids and cleared alert flags.
pub fn seed_vehicles<R: Rng>(
    world: &mut World,
    route: &Route,
    bounds: &MapBounds,
    count: usize,
    on_route_fraction: f64,
    rng: &mut R,
) {
    let existing: Vec<Entity> = world
        .query_filtered::<Entity, With<Vehicle>>()
        .iter(world)
        .collect();
    for entity in existing {
        world.despawn(entity);
    }

    let on_route = ((count as f64) * on_route_fraction.clamp(0.0, 1.0)).round() as usize;
    let on_route = on_route.min(count);
    let waypoints = route.points();

    for id in 0..count {
        let position = if id < on_route {
            waypoints[rng.gen_range(0..waypoints.len() - 1)]
        } else {
            bounds.random_point(rng)
        };
        world.spawn((
            Vehicle {
                id: VehicleId(id as u32),
                alerted: false,
            },
            Position(position),
        ));
    }
}
