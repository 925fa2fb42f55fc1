//! Alert system: classify every vehicle against the ambulance position and
//! apply the result as a full replacement of the previous alert flags.
//!
//! Runs on `UpdateAlerts` events, which the movement systems schedule for
//! the same simulation instant as the position they emitted, so the
//! classification always sees the position of its own tick. Events from a
//! cancelled run are dropped by the run-id guard, which is what makes a
//! stop discard an already-queued classification.

use bevy_ecs::prelude::{Query, Res, ResMut};
use h3o::LatLng;

use crate::animator::Animator;
use crate::clock::{CurrentEvent, EventKind};
use crate::ecs::{Position, Vehicle, VehicleId};
use crate::proximity::ProximityClassifier;
use crate::telemetry::{SimEvent, SimEvents, SimTelemetry, DEGRADED_ALERTS_MESSAGE};

pub fn update_alerts_system(
    event: Res<CurrentEvent>,
    animator: Res<Animator>,
    classifier: Res<ProximityClassifier>,
    mut vehicles: Query<(&mut Vehicle, &Position)>,
    mut events: ResMut<SimEvents>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::UpdateAlerts {
        return;
    }
    if event.0.run != animator.run() || !animator.is_running() {
        return;
    }
    let Some(origin) = animator.position() else {
        return;
    };

    // Stable destination order so matrix responses align across ticks.
    let mut snapshot: Vec<(VehicleId, LatLng)> = vehicles
        .iter()
        .map(|(vehicle, position)| (vehicle.id, position.0))
        .collect();
    snapshot.sort_by_key(|(id, _)| *id);

    let classification = classifier.classify(origin, &snapshot);
    telemetry.classifications += 1;
    if classification.degraded {
        telemetry.degraded_classifications += 1;
        events.push(SimEvent::Degraded(DEGRADED_ALERTS_MESSAGE.to_string()));
    }

    for (mut vehicle, _) in vehicles.iter_mut() {
        vehicle.alerted = classification
            .alerts
            .get(&vehicle.id)
            .copied()
            .unwrap_or(false);
    }
    events.push(SimEvent::AlertStateChanged(classification.alerts));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Event, RunId, SimulationClock, TickInterval};
    use crate::routing::Route;
    use bevy_ecs::prelude::{Schedule, World};

    fn setup_world(radius_km: f64) -> (World, RunId) {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimEvents::default());
        world.insert_resource(SimTelemetry::default());
        world.insert_resource(TickInterval(16));
        world.insert_resource(ProximityClassifier::new(radius_km));

        let route = Route::new(vec![
            LatLng::new(23.0225, 72.6369).expect("valid point"),
            LatLng::new(23.05, 72.66).expect("valid point"),
        ])
        .expect("route");

        let mut animator = Animator::new(60);
        let run = animator.start(route);
        world.insert_resource(animator);
        (world, run)
    }

    fn run_alerts(world: &mut World, run: RunId) {
        let mut schedule = Schedule::default();
        schedule.add_systems(update_alerts_system);
        world.insert_resource(CurrentEvent(Event {
            timestamp: 0,
            kind: EventKind::UpdateAlerts,
            run,
        }));
        schedule.run(world);
    }

    #[test]
    fn nearby_vehicle_is_flagged_and_the_full_map_is_emitted() {
        let (mut world, run) = setup_world(10.0);
        world.spawn((
            Vehicle {
                id: VehicleId(0),
                alerted: false,
            },
            Position(LatLng::new(23.03, 72.64).expect("valid point")),
        ));
        world.spawn((
            Vehicle {
                id: VehicleId(1),
                alerted: true,
            },
            Position(LatLng::new(25.0, 75.0).expect("valid point")),
        ));

        run_alerts(&mut world, run);

        let mut query = world.query::<&Vehicle>();
        for vehicle in query.iter(&world) {
            match vehicle.id {
                VehicleId(0) => assert!(vehicle.alerted),
                _ => assert!(!vehicle.alerted, "distant vehicle must be cleared"),
            }
        }

        let drained = world.resource_mut::<SimEvents>().drain();
        assert_eq!(drained.len(), 1);
        match &drained[0] {
            SimEvent::AlertStateChanged(alerts) => {
                assert_eq!(alerts.len(), 2);
                assert_eq!(alerts[&VehicleId(0)], true);
                assert_eq!(alerts[&VehicleId(1)], false);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(world.resource::<SimTelemetry>().classifications, 1);
    }

    #[test]
    fn stale_run_classification_is_discarded() {
        let (mut world, run) = setup_world(10.0);
        world.spawn((
            Vehicle {
                id: VehicleId(0),
                alerted: false,
            },
            Position(LatLng::new(23.03, 72.64).expect("valid point")),
        ));

        run_alerts(&mut world, RunId(run.0.wrapping_add(1)));

        let mut query = world.query::<&Vehicle>();
        assert!(query.iter(&world).all(|vehicle| !vehicle.alerted));
        assert!(world.resource_mut::<SimEvents>().drain().is_empty());
        assert_eq!(world.resource::<SimTelemetry>().classifications, 0);
    }
}
