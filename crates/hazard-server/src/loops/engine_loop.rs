//! The task that owns the navigation engine.
//!
//! Commands are processed strictly one at a time in arrival order. After each
//! command the new snapshot is published before the caller gets its answer,
//! so a handler that awaited its reply always reads up-to-date state.

use std::sync::Arc;

use hazard_core::{
    Alert, EngineSnapshot, GeoPoint, NavError, NavigationEngine, NearbyAlert, PositionSample,
    RawRoute, RouteRequest, RoutePreference,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::oracle::RouteOracle;
use crate::state::AlertStore;

type Reply<T> = oneshot::Sender<T>;

pub enum EngineCommand {
    Position {
        sample: PositionSample,
        reply: Reply<Result<(), NavError>>,
    },
    PositionError {
        reason: String,
        reply: Reply<()>,
    },
    AlertsChanged {
        reply: Reply<()>,
    },
    NewAlert {
        alert: Alert,
        reply: Reply<()>,
    },
    RequestRoutes {
        destination: GeoPoint,
        preference: RoutePreference,
        reply: Reply<Result<RouteRequest, NavError>>,
    },
    /// Posted by the oracle task when its request completes.
    RoutesResolved {
        request: RouteRequest,
        routes: Vec<RawRoute>,
    },
    SelectRoute {
        route_id: String,
        reply: Reply<Result<(), NavError>>,
    },
    StartNavigation {
        reply: Reply<Result<(), NavError>>,
    },
    StopNavigation {
        reply: Reply<()>,
    },
    DismissReroute {
        reply: Reply<()>,
    },
    StartGeofencing {
        reply: Reply<()>,
    },
    StopGeofencing {
        reply: Reply<()>,
    },
    Nearby {
        radius_m: Option<f64>,
        reply: Reply<Vec<NearbyAlert>>,
    },
}

/// What the engine task needs besides the engine itself.
pub struct EngineContext {
    pub alerts: Arc<AlertStore>,
    /// Weak so the queue closes once every `AppState` is gone.
    pub commands: mpsc::WeakSender<EngineCommand>,
    pub snapshot: watch::Sender<EngineSnapshot>,
    pub oracle: Arc<dyn RouteOracle>,
}

type Answer = Box<dyn FnOnce() + Send>;

fn answer<T: Send + 'static>(reply: Reply<T>, value: T) -> Option<Answer> {
    Some(Box::new(move || {
        // The caller may have given up waiting
        let _ = reply.send(value);
    }))
}

pub async fn run_engine_loop(
    mut engine: NavigationEngine,
    mut queue: mpsc::Receiver<EngineCommand>,
    context: EngineContext,
) {
    tracing::info!("Navigation engine task started");

    while let Some(command) = queue.recv().await {
        let pending = handle_command(&mut engine, command, &context);
        context.snapshot.send_replace(engine.snapshot());
        if let Some(pending) = pending {
            pending();
        }
    }

    tracing::info!("Navigation engine command queue closed");
}

fn handle_command(
    engine: &mut NavigationEngine,
    command: EngineCommand,
    context: &EngineContext,
) -> Option<Answer> {
    match command {
        EngineCommand::Position { sample, reply } => {
            let result = engine.on_position(&sample);
            if let Err(err) = &result {
                tracing::debug!("Rejected position fix: {}", err);
            }
            answer(reply, result)
        }
        EngineCommand::PositionError { reason, reply } => {
            engine.on_position_error(&reason);
            answer(reply, ())
        }
        EngineCommand::AlertsChanged { reply } => {
            engine.on_alerts_changed(&context.alerts.all());
            answer(reply, ())
        }
        EngineCommand::NewAlert { alert, reply } => {
            engine.on_new_alert(&alert);
            answer(reply, ())
        }
        EngineCommand::RequestRoutes {
            destination,
            preference,
            reply,
        } => {
            let result = engine.request_routes(destination, preference);
            if let Ok(request) = &result {
                spawn_route_request(request.clone(), context);
            }
            answer(reply, result)
        }
        EngineCommand::RoutesResolved { request, routes } => {
            let accepted = engine.resolve_routes(&request, routes, &context.alerts.all());
            if accepted {
                tracing::info!(
                    "Installed {} candidate(s) for route request {}",
                    engine.session().routes().len(),
                    request.id
                );
            }
            None
        }
        EngineCommand::SelectRoute { route_id, reply } => {
            answer(reply, engine.select_route(&route_id))
        }
        EngineCommand::StartNavigation { reply } => answer(reply, engine.start_navigation()),
        EngineCommand::StopNavigation { reply } => {
            engine.stop_navigation();
            answer(reply, ())
        }
        EngineCommand::DismissReroute { reply } => {
            engine.dismiss_reroute();
            answer(reply, ())
        }
        EngineCommand::StartGeofencing { reply } => {
            engine.start_geofencing(&context.alerts.all());
            answer(reply, ())
        }
        EngineCommand::StopGeofencing { reply } => {
            engine.stop_geofencing();
            answer(reply, ())
        }
        EngineCommand::Nearby { radius_m, reply } => {
            answer(reply, engine.nearby_alerts(radius_m))
        }
    }
}

/// Ask the oracle off the engine task and post the answer back to the queue.
///
/// Oracle failures become an empty candidate list.
fn spawn_route_request(request: RouteRequest, context: &EngineContext) {
    let oracle = context.oracle.clone();
    let commands = context.commands.clone();

    tokio::spawn(async move {
        let routes = match oracle.get_routes(request.origin, request.destination).await {
            Ok(routes) => routes,
            Err(err) => {
                tracing::error!("Routing oracle request {} failed: {:#}", request.id, err);
                Vec::new()
            }
        };

        let Some(commands) = commands.upgrade() else {
            return;
        };
        if commands
            .send(EngineCommand::RoutesResolved { request, routes })
            .await
            .is_err()
        {
            tracing::warn!("Engine task stopped before routes were resolved");
        }
    });
}
