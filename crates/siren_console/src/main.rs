//! Headless console host for the ambulance proximity-alert engine.
//!
//! Stands in for the map/toast rendering layer: drives the controller to
//! completion and prints every output event. Without an OpenRouteService
//! key the route is a straight-line interpolation and classification runs
//! on great-circle distances only.

use anyhow::Result;
use clap::Parser;

use siren_core::controller::SimulationController;
use siren_core::routing::RouteSourceKind;
use siren_core::scenario::{MatrixConfig, SimulationParams, OPENROUTESERVICE_ENDPOINT};
use siren_core::telemetry::SimEvent;

#[derive(Debug, Parser)]
#[command(author, version, about = "Ambulance proximity-alert simulation")]
struct Cli {
    /// Number of vehicles to seed along and around the route
    #[arg(long, default_value_t = 20)]
    vehicles: usize,

    /// Alert radius in kilometres
    #[arg(long, default_value_t = 10.0)]
    radius_km: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Interpolation steps for the synthetic route (ignored with an API key)
    #[arg(long, default_value_t = 10)]
    route_steps: usize,

    /// OpenRouteService API key; enables the directions and matrix services
    #[arg(long)]
    ors_api_key: Option<String>,

    /// Maximum number of clock events to process
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut params = SimulationParams::default()
        .with_vehicle_count(cli.vehicles)
        .with_alert_radius_km(cli.radius_km)
        .with_route_source(RouteSourceKind::Linear {
            steps: cli.route_steps,
        });
    if let Some(seed) = cli.seed {
        params = params.with_seed(seed);
    }
    if let Some(api_key) = cli.ors_api_key {
        params = params
            .with_route_source(RouteSourceKind::Ors {
                endpoint: OPENROUTESERVICE_ENDPOINT.to_string(),
                api_key: api_key.clone(),
            })
            .with_matrix(MatrixConfig {
                endpoint: OPENROUTESERVICE_ENDPOINT.to_string(),
                api_key,
            });
    }

    let mut controller = SimulationController::new(params);
    controller.generate_route()?;
    print_events(controller.drain_events());

    controller.start()?;
    let mut steps = 0usize;
    while steps < cli.max_steps && controller.step() {
        steps += 1;
        print_events(controller.drain_events());
    }

    let telemetry = controller.telemetry();
    println!(
        "processed {} events: {} move steps, {} classifications ({} degraded), {} completed runs",
        steps,
        telemetry.ticks,
        telemetry.classifications,
        telemetry.degraded_classifications,
        telemetry.completed_runs
    );
    Ok(())
}

fn print_events(events: Vec<SimEvent>) {
    for event in events {
        match event {
            SimEvent::RouteReady(route) => {
                let start = route.start();
                let end = route.end();
                println!(
                    "route ready: {} waypoints from ({:.4}, {:.4}) to ({:.4}, {:.4})",
                    route.waypoint_count(),
                    start.lat(),
                    start.lng(),
                    end.lat(),
                    end.lng()
                );
            }
            SimEvent::PositionUpdate(position) => {
                println!("ambulance at ({:.5}, {:.5})", position.lat(), position.lng());
            }
            SimEvent::AlertStateChanged(alerts) => {
                let alerted = alerts.values().filter(|flag| **flag).count();
                println!("alerts: {}/{} vehicles within radius", alerted, alerts.len());
            }
            SimEvent::Degraded(message) => println!("degraded: {}", message),
            SimEvent::Error(message) => eprintln!("error: {}", message),
        }
    }
}
