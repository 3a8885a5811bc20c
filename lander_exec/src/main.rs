//! Main lander executable entry point.
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Initialises the session, logging and parameters
//!     - Creates the equipment (currently the simulated world)
//!     - Starts the visualisation thread
//!     - Builds the follower and flies until it terminates
//!     - Archives the flight report
//!
//! Ctrl-C stops the follower between cycles, which stops and lands the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use structopt::StructOpt;

// Internal
use lander_lib::{
    follower::{Collaborators, Follower},
    params::LanderExecParams,
    sim::{SimCamera, SimTracker, SimVehicle, SimWorld},
    vis::{FrameSaver, LogVisualiser, SnapshotSlot, VisKind, VisThread, Visualiser},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "lander_exec", about = "Follow a target and land on it")]
struct Opt {
    /// Parameter file, relative to the params directory of the software root
    #[structopt(short, long, default_value = "lander_exec.toml")]
    params: String,

    /// Minimum log level, info or more verbose
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// Override the simulated initial x offset to the target, in cm
    #[structopt(long)]
    offset_x: Option<f64>,

    /// Override the simulated initial y offset to the target, in cm
    #[structopt(long)]
    offset_y: Option<f64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("lander_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log = logger_init(opt.log_level, &session, "lander_exec")
        .wrap_err("Failed to initialise logging")?;

    info!(target: log.target(), "Lander Executable\n");
    info!(target: log.target(), "Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: LanderExecParams =
        util::params::load(&opt.params).wrap_err("Could not load exec params")?;

    if let Some(x) = opt.offset_x {
        params.sim.initial_offset_cm[0] = x;
    }
    if let Some(y) = opt.offset_y {
        params.sim.initial_offset_cm[1] = y;
    }

    params.validate().wrap_err("Invalid exec params")?;
    session.save("params.json", params.clone());

    info!(target: log.target(), "Exec parameters loaded");

    // ---- STOP SIGNAL ----

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        let log = log.clone();
        ctrlc::set_handler(move || {
            warn!(target: log.target(), "Ctrl-C received, stopping");
            stop.store(true, Ordering::Relaxed);
        })
        .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE EQUIPMENT ----

    let world = SimWorld::new(&params.sim);

    let collaborators = Collaborators {
        cam: Box::new(SimCamera::new(&params.sim)),
        tracker: Box::new(SimTracker::new(world.clone(), params.sim.clone())),
        vehicle: Box::new(SimVehicle::new(
            world.clone(),
            params.sim.takeoff_height_cm,
            session::get_elapsed_seconds,
            log.component("sim"),
        )),
    };

    info!(target: log.target(), "Simulated equipment initialised");

    // ---- INITIALISE VISUALISATION ----

    let slot = SnapshotSlot::new();

    let visualiser: Box<dyn Visualiser> = match params.vis.kind {
        VisKind::Log => Box::new(LogVisualiser::new(slot.clone(), log.component("vis"))),
        VisKind::Frames => Box::new(
            FrameSaver::new(
                session.arch_root.join("frames"),
                params.vis.save_every_n,
                log.component("vis"),
            )
            .wrap_err("Failed to initialise the frame saver")?,
        ),
    };

    let vis_thread = VisThread::spawn(
        slot.clone(),
        visualiser,
        Duration::from_secs_f64(params.vis.poll_period_s),
        log.component("vis"),
    );

    // ---- INITIALISE FOLLOWER ----

    let mut follower = Follower::new(
        params.follower.clone(),
        collaborators,
        &params.control,
        &params.landing,
        slot,
        stop,
        log.component("follower"),
    )
    .wrap_err("Failed to initialise the follower")?;

    // ---- MAIN LOOP ----

    info!(target: log.target(), "Begining flight\n");

    let report = follower
        .run(session::get_elapsed_seconds)
        .wrap_err("Takeoff failed")?;

    // ---- SHUTDOWN ----

    let vis_stats = vis_thread.stop();

    info!(target: log.target(), "Flight complete: {:#?}", report);
    info!(target: log.target(), "Final simulation state: {:?}", world.state());

    session.save("flight_report.json", report);
    session.save("vis_stats.json", vis_stats);

    info!(target: log.target(), "End of execution");

    session.exit();

    Ok(())
}
