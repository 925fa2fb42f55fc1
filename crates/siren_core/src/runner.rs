//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each
//! step pops the next event from [`SimulationClock`], inserts it as
//! [`CurrentEvent`], then runs the schedule. A UI host calls
//! [`run_next_event`] from its frame callback; a headless host loops
//! [`run_until_idle`].

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::systems::alerts::update_alerts_system;
use crate::systems::movement::{move_step_system, simulation_started_system};

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_move_step(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::MoveStep)
        .unwrap_or(false)
}

fn is_update_alerts(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::UpdateAlerts)
        .unwrap_or(false)
}

/// Builds the simulation schedule: each system runs only for its event kind.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        move_step_system.run_if(is_move_step),
        update_alerts_system.run_if(is_update_alerts),
    ));
    schedule
}

/// Runs one simulation step: pops the next event, inserts it as
/// [`CurrentEvent`], then runs the schedule. Returns `false` once the clock
/// is empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(event) => event,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs simulation steps until the clock is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_idle(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}
