//! The main tick loop: clock increment, periodic energy/entropy inflow,
//! random cell selection, VM invocation, periodic reporting.
//!
//! `World` bundles every piece of process-wide mutable state — the pond,
//! the PRNG, the monotonic id counter, and the current reporting window's
//! statistics — into a single value threaded explicitly through the
//! scheduler and the VM, rather than free-standing globals. This mirrors
//! the "explicit context struct instead of statics" idiom this codebase
//! already uses for its own streaming state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cell::Genome;
use crate::config::Config;
use crate::error::ReportError;
use crate::pond::Pond;
use crate::prng::Prng;
use crate::report::{ReportSink, Snapshot};
use crate::stats::StatCounters;
use crate::vm;

/// Process-wide mutable state shared by the scheduler and the VM.
pub struct World {
    pub pond: Pond,
    pub prng: Prng,
    pub stats: StatCounters,
    /// `pub(crate)` rather than private: the VM's KILL/offspring-commit arms
    /// need to allocate an id while `self.pond` is already mutably borrowed
    /// (via [`crate::pond::Pond::split_pair_mut`]). Going through
    /// [`alloc_id`] as a field projection (`alloc_id(&mut world.next_id)`)
    /// keeps that borrow disjoint from `world.pond` in the borrow checker's
    /// eyes; a `&mut self` method on `World` itself would not be.
    pub(crate) next_id: u64,
}

impl World {
    pub fn new(cfg: &Config) -> Self {
        World {
            pond: Pond::new(cfg.pond_size_x, cfg.pond_size_y, cfg.pond_depth),
            prng: Prng::seeded(cfg.random_seed),
            stats: StatCounters::new(),
            next_id: 0,
        }
    }

    /// Allocate the next monotonic cell id. Id `0` is reserved and never
    /// handed out.
    ///
    /// Convenience wrapper around [`alloc_id`] for callers (e.g. the
    /// scheduler's own `inflow`) that aren't also holding a live borrow of
    /// `self.pond`.
    pub fn alloc_id(&mut self) -> u64 {
        alloc_id(&mut self.next_id)
    }
}

/// Allocate the next monotonic id given a direct `&mut` borrow of the
/// counter field. A free function rather than a `World` method so it can be
/// called as `alloc_id(&mut world.next_id)` — a field projection the borrow
/// checker can see is disjoint from a simultaneous `&mut world.pond` borrow.
#[inline]
pub(crate) fn alloc_id(next_id: &mut u64) -> u64 {
    *next_id += 1;
    *next_id
}

/// Cooperative shutdown signal, tested at the top of every tick.
///
/// A single process-wide flag, set from a `SIGINT`/`SIGTERM` handler at the
/// binary boundary (see `bin/nanopond.rs`); there are no suspension points
/// inside the scheduler itself, so a plain `AtomicBool` is sufficient — no
/// async runtime is warranted.
#[derive(Clone)]
pub struct ExitSignal(Arc<AtomicBool>);

impl ExitSignal {
    pub fn new() -> Self {
        ExitSignal(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Default for ExitSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the simulation until `exit` is set, driving `sink` with every report.
///
/// Ticks start at 1. Each tick: (1) emit+reset a report every
/// `report_frequency` ticks, (2) seed a random slot every `inflow_frequency`
/// ticks, (3) execute one randomly chosen cell's VM.
pub fn run(
    cfg: &Config,
    world: &mut World,
    sink: &mut dyn ReportSink,
    exit: &ExitSignal,
) -> Result<(), ReportError> {
    let mut clock: u64 = 0;
    let mut last_viable_positive = false;

    loop {
        if exit.is_set() {
            tracing::info!(target: "sim.scheduler", clock, "cooperative_shutdown");
            break;
        }
        clock += 1;

        if clock % cfg.report_frequency == 0 {
            let snapshot = scan_report(world, clock);
            tracing::info!(
                target: "sim.scheduler",
                clock,
                total_energy = snapshot.total_energy as u64,
                alive = snapshot.alive_count,
                viable = snapshot.viable_count,
                "report"
            );
            let viable_positive = snapshot.viable_count > 0;
            if viable_positive != last_viable_positive {
                tracing::info!(
                    target: "sim.report",
                    clock,
                    viable_count = snapshot.viable_count,
                    "viable_population_transition"
                );
            }
            last_viable_positive = viable_positive;
            sink.emit(&snapshot)?;
            world.stats.reset();
        }

        if clock % cfg.inflow_frequency == 0 {
            inflow(world, cfg);
        }

        if cfg.viz_enabled && clock % cfg.viz_frequency == 0 {
            if let Err(e) = crate::viz::write_ppm_frame(&world.pond, &cfg.viz_path) {
                tracing::error!(target: "sim.scheduler", clock, error = %e, "viz_frame_write_failed");
            }
        }

        let r = world.prng.next_u64();
        let x = (r % cfg.pond_size_x as u64) as usize;
        let y = ((r / cfg.pond_size_x as u64) >> 1) as usize % cfg.pond_size_y;
        vm::execute(world, x, y, cfg.mutation_rate, cfg.failed_kill_penalty);
        world.stats.cell_executions += 1;
    }

    Ok(())
}

/// Seed a uniformly random slot with a fresh identity, additive energy, and
/// a freshly randomized genome.
fn inflow(world: &mut World, cfg: &Config) {
    let r = world.prng.next_u64();
    let x = (r % cfg.pond_size_x as u64) as usize;
    let y = ((r / cfg.pond_size_x as u64) % cfg.pond_size_y as u64) as usize;

    let fresh_id = world.alloc_id();
    let variation = if cfg.inflow_rate_variation == 0 {
        0
    } else {
        world.prng.next_u64() % cfg.inflow_rate_variation
    };
    let added_energy = cfg.inflow_rate_base + variation;

    let mut genome = Genome::blank(cfg.pond_depth);
    genome.randomize(&mut world.prng);

    let cell = world.pond.get_mut(x, y);
    cell.id = fresh_id;
    cell.parent_id = 0;
    cell.lineage = fresh_id;
    cell.generation = 0;
    cell.energy += added_energy;
    cell.genome = genome;
}

/// A single atomic pass over the whole pond, producing the statistics a
/// CSV report row is built from (§6).
fn scan_report(world: &World, clock: u64) -> Snapshot {
    let mut total_energy: u128 = 0;
    let mut alive_count: u64 = 0;
    let mut viable_count: u64 = 0;
    let mut max_generation: u64 = 0;

    for cell in world.pond.iter() {
        if cell.is_alive() {
            total_energy += cell.energy as u128;
            alive_count += 1;
            if cell.generation > max_generation {
                max_generation = cell.generation;
            }
            if cell.is_viable() {
                viable_count += 1;
            }
        }
    }

    Snapshot {
        clock,
        total_energy,
        alive_count,
        viable_count,
        max_generation,
        viable_replaced: world.stats.viable_replaced,
        viable_killed: world.stats.viable_killed,
        viable_shares: world.stats.viable_shares,
        instr: world.stats.instr,
        cell_executions: world.stats.cell_executions,
    }
}
