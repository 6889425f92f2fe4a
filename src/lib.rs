//! Crate root: public surface and module map for the nanopond simulation
//! engine.
//!
//! This module is the single canonical entry-point for downstream users of
//! the library — it re-exports the scheduler's orchestrators and the
//! configuration/error types needed to drive a run, and documents the
//! invariants the submodules below maintain.
//!
//! ## Invariants
//!
//! - **Genome packing.** Every cell carries a fixed-length genome of
//!   `pond_depth` 4-bit codons, packed 16-per-word into `u64` words. No
//!   genome is ever a different length than the pond it lives in was
//!   configured with.
//! - **Global state is explicit.** The id counter, PRNG, and statistics are
//!   not free-standing statics; they live on [`scheduler::World`], passed by
//!   `&mut` through the scheduler and the VM. This keeps the simulation
//!   testable and leaves room for more than one independent pond in a
//!   process.
//! - **The hot path is infallible.** [`vm::execute`] never returns a
//!   `Result`; a loop-stack overflow sets the VM's `stop` flag and an
//!   invariant violation is a programmer error that panics. Only
//!   configuration parsing and the reporting sinks are fallible, via
//!   [`error::ConfigError`] and [`error::ReportError`].
//! - **`#![forbid(unsafe_code)]`.** No module in this crate needs it.

#![forbid(unsafe_code)]

/// The fast xorshift+ pseudo-random source every other component draws from.
pub mod prng;
/// Cell state: packed genome and identity/lineage fields.
pub mod cell;
/// The toroidal grid of cells and its neighbor addressing.
pub mod pond;
/// The similarity-gated access check shared by KILL, SHARE, and offspring commit.
pub mod interaction;
/// The per-cell VM: fetch-mutate-execute over the packed codon genome.
pub mod vm;
/// Per-reporting-window execution and event counters.
pub mod stats;
/// The main tick loop and the process-wide `World` it threads through.
pub mod scheduler;
/// Compile-time-constant defaults and CLI flag parsing.
pub mod config;
/// Typed errors for configuration parsing and the reporting sinks.
pub mod error;
/// The periodic CSV report and its sink trait.
pub mod report;
/// The optional PPM framebuffer visualization sink.
pub mod viz;

// ============================================================================
// Root-level re-exports
// ============================================================================

/// Re-export the scheduler's entry point and the shared mutable state it
/// threads through.
pub use scheduler::{run, ExitSignal, World};

/// Re-export the configuration surface so downstream code only needs
/// `nanopond::Config`.
pub use config::Config;

/// Re-export both fallible-boundary error types at the crate root, following
/// this codebase's existing single-site re-export convention.
pub use error::{ConfigError, ReportError};

/// Re-export the report types needed to wire a custom sink.
pub use report::{CsvSink, NullSink, ReportSink, Snapshot};
