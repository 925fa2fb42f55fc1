//! Movement systems: place the ambulance and advance it tick by tick.
//!
//! `SimulationStarted` emits the initial position and primes the event
//! chain; each `MoveStep` advances the animator, emits the new position,
//! and schedules the same-time alert pass plus the next step. When the
//! animator reports completion the run winds down: every alert flag is
//! cleared and the all-false map is emitted, mirroring an explicit stop.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::animator::{Animator, TickOutcome};
use crate::clock::{CurrentEvent, EventKind, SimulationClock, TickInterval};
use crate::ecs::Vehicle;
use crate::proximity::AlertStates;
use crate::telemetry::{SimEvent, SimEvents, SimTelemetry};

pub fn simulation_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    animator: Res<Animator>,
    interval: Res<TickInterval>,
    mut events: ResMut<SimEvents>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }
    if event.0.run != animator.run() || !animator.is_running() {
        return;
    }
    let Some(position) = animator.position() else {
        return;
    };

    events.push(SimEvent::PositionUpdate(position));

    let now = clock.now();
    clock.schedule_at(now, EventKind::UpdateAlerts, event.0.run);
    clock.schedule_at(now + interval.0, EventKind::MoveStep, event.0.run);
}

pub fn move_step_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut animator: ResMut<Animator>,
    interval: Res<TickInterval>,
    mut vehicles: Query<&mut Vehicle>,
    mut events: ResMut<SimEvents>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::MoveStep {
        return;
    }
    if event.0.run != animator.run() || !animator.is_running() {
        return;
    }

    telemetry.ticks += 1;

    match animator.advance() {
        Some(TickOutcome::Moved(position)) => {
            events.push(SimEvent::PositionUpdate(position));
            let now = clock.now();
            clock.schedule_at(now, EventKind::UpdateAlerts, event.0.run);
            clock.schedule_at(now + interval.0, EventKind::MoveStep, event.0.run);
        }
        Some(TickOutcome::Completed) => {
            let mut cleared = AlertStates::new();
            for mut vehicle in vehicles.iter_mut() {
                vehicle.alerted = false;
                cleared.insert(vehicle.id, false);
            }
            events.push(SimEvent::AlertStateChanged(cleared));
            telemetry.completed_runs += 1;
            log::info!("route complete after {} move steps", telemetry.ticks);
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RunId;
    use crate::routing::Route;
    use bevy_ecs::prelude::{Schedule, World};
    use h3o::LatLng;

    fn setup_world(steps_per_segment: u32) -> (World, RunId) {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimEvents::default());
        world.insert_resource(SimTelemetry::default());
        world.insert_resource(TickInterval(16));

        let route = Route::new(vec![
            LatLng::new(0.0, 0.0).expect("valid point"),
            LatLng::new(0.0, 1.0).expect("valid point"),
        ])
        .expect("route");

        let mut animator = Animator::new(steps_per_segment);
        let run = animator.start(route);
        world.insert_resource(animator);
        (world, run)
    }

    fn run_event(world: &mut World, schedule: &mut Schedule, kind: EventKind, run: RunId) {
        let timestamp = world.resource::<SimulationClock>().now();
        world.insert_resource(CurrentEvent(crate::clock::Event {
            timestamp,
            kind,
            run,
        }));
        schedule.run(world);
    }

    #[test]
    fn simulation_started_emits_the_first_position_and_primes_the_chain() {
        let (mut world, run) = setup_world(60);
        let mut schedule = Schedule::default();
        schedule.add_systems(simulation_started_system);

        run_event(&mut world, &mut schedule, EventKind::SimulationStarted, run);

        let drained = world.resource_mut::<SimEvents>().drain();
        assert_eq!(
            drained,
            vec![SimEvent::PositionUpdate(LatLng::new(0.0, 0.0).unwrap())]
        );

        let mut clock = world.resource_mut::<SimulationClock>();
        assert_eq!(clock.pending_event_count(), 2);
        let first = clock.pop_next().expect("first event");
        assert_eq!(first.kind, EventKind::UpdateAlerts);
        let second = clock.pop_next().expect("second event");
        assert_eq!(second.kind, EventKind::MoveStep);
        assert_eq!(second.timestamp, 16);
    }

    #[test]
    fn move_step_advances_and_reschedules_until_completion() {
        let (mut world, run) = setup_world(2);
        let mut schedule = Schedule::default();
        schedule.add_systems(move_step_system);

        run_event(&mut world, &mut schedule, EventKind::MoveStep, run);
        let drained = world.resource_mut::<SimEvents>().drain();
        assert_eq!(
            drained,
            vec![SimEvent::PositionUpdate(LatLng::new(0.0, 0.5).unwrap())]
        );
        assert_eq!(
            world.resource::<SimulationClock>().pending_event_count(),
            2
        );

        // Second step completes the two-point route: no reschedule, alert
        // map cleared.
        world.resource_mut::<SimulationClock>().clear();
        run_event(&mut world, &mut schedule, EventKind::MoveStep, run);
        let drained = world.resource_mut::<SimEvents>().drain();
        assert_eq!(
            drained,
            vec![SimEvent::AlertStateChanged(AlertStates::new())]
        );
        assert!(world.resource::<SimulationClock>().is_empty());
        assert_eq!(world.resource::<SimTelemetry>().completed_runs, 1);
        assert!(!world.resource::<Animator>().is_running());
    }

    #[test]
    fn stale_run_events_are_ignored() {
        let (mut world, run) = setup_world(60);
        let mut schedule = Schedule::default();
        schedule.add_systems(move_step_system);

        run_event(
            &mut world,
            &mut schedule,
            EventKind::MoveStep,
            RunId(run.0.wrapping_add(1)),
        );

        assert!(world.resource_mut::<SimEvents>().drain().is_empty());
        assert!(world.resource::<SimulationClock>().is_empty());
        assert_eq!(world.resource::<SimTelemetry>().ticks, 0);
    }
}
