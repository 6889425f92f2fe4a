//! Compile-time-constant defaults, overridable at process start by CLI flags.
//!
//! Parsing follows this codebase's existing `--flag value` style (see
//! `bin/prover.rs`'s `parse_flag`/`parse_u64` helpers) rather than pulling in
//! a CLI-parsing dependency — the flag surface here is small and flat enough
//! that a dedicated parser crate would be pure overhead.

use crate::error::ConfigError;

/// Ticks between reports.
pub const DEFAULT_REPORT_FREQUENCY: u64 = 200_000;
/// Mutation probability numerator over 2^32.
pub const DEFAULT_MUTATION_RATE: u64 = 5_000;
/// Ticks between seedings.
pub const DEFAULT_INFLOW_FREQUENCY: u64 = 100;
/// Base seed energy.
pub const DEFAULT_INFLOW_RATE_BASE: u64 = 600;
/// Seed energy uniform-add upper bound (exclusive).
pub const DEFAULT_INFLOW_RATE_VARIATION: u64 = 1_000;
/// Grid width.
pub const DEFAULT_POND_SIZE_X: usize = 800;
/// Grid height.
pub const DEFAULT_POND_SIZE_Y: usize = 600;
/// Genome length in codons; must be a multiple of 16.
pub const DEFAULT_POND_DEPTH: usize = 1_024;
/// Self-energy divisor on a failed KILL of a viable target.
pub const DEFAULT_FAILED_KILL_PENALTY: u64 = 3;
/// Primary PRNG seed.
pub const DEFAULT_RANDOM_SEED: u64 = crate::prng::DEFAULT_SEED;

/// Runtime configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    pub report_frequency: u64,
    pub mutation_rate: u64,
    pub inflow_frequency: u64,
    pub inflow_rate_base: u64,
    pub inflow_rate_variation: u64,
    pub pond_size_x: usize,
    pub pond_size_y: usize,
    pub pond_depth: usize,
    pub failed_kill_penalty: u64,
    pub random_seed: u64,

    /// Path the CSV report rows are appended to; `None` writes to stdout.
    pub csv_path: Option<String>,

    /// Whether the optional PPM framebuffer sink is enabled.
    pub viz_enabled: bool,
    /// Path PPM frames are written to when `viz_enabled`.
    pub viz_path: String,
    /// Ticks between PPM frame writes.
    pub viz_frequency: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            report_frequency: DEFAULT_REPORT_FREQUENCY,
            mutation_rate: DEFAULT_MUTATION_RATE,
            inflow_frequency: DEFAULT_INFLOW_FREQUENCY,
            inflow_rate_base: DEFAULT_INFLOW_RATE_BASE,
            inflow_rate_variation: DEFAULT_INFLOW_RATE_VARIATION,
            pond_size_x: DEFAULT_POND_SIZE_X,
            pond_size_y: DEFAULT_POND_SIZE_Y,
            pond_depth: DEFAULT_POND_DEPTH,
            failed_kill_penalty: DEFAULT_FAILED_KILL_PENALTY,
            random_seed: DEFAULT_RANDOM_SEED,
            csv_path: None,
            viz_enabled: false,
            viz_path: "nanopond.ppm".to_string(),
            viz_frequency: DEFAULT_REPORT_FREQUENCY,
        }
    }
}

impl Config {
    /// Validate cross-field invariants not expressible per-flag.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pond_depth % 16 != 0 {
            return Err(ConfigError::DepthNotMultipleOf16(self.pond_depth as u64));
        }
        if self.pond_size_x == 0 || self.pond_size_y == 0 {
            return Err(ConfigError::NotPositive {
                flag: "--pond-size-x/--pond-size-y",
                value: 0,
            });
        }
        Ok(())
    }

    /// Parse `args` (excluding `argv[0]`) in `--flag value` form, layering
    /// overrides on top of [`Config::default`].
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        let args: Vec<String> = args.into_iter().collect();
        let mut it = args.iter();
        while let Some(flag) = it.next() {
            macro_rules! next_u64 {
                ($flag:literal) => {{
                    let raw = it.next().ok_or(ConfigError::MissingValue($flag))?;
                    raw.parse::<u64>().map_err(|_| ConfigError::NotAnInteger {
                        flag: $flag,
                        value: raw.clone(),
                    })?
                }};
            }
            match flag.as_str() {
                "--report-frequency" => cfg.report_frequency = next_u64!("--report-frequency"),
                "--mutation-rate" => cfg.mutation_rate = next_u64!("--mutation-rate"),
                "--inflow-frequency" => cfg.inflow_frequency = next_u64!("--inflow-frequency"),
                "--inflow-rate-base" => cfg.inflow_rate_base = next_u64!("--inflow-rate-base"),
                "--inflow-rate-variation" => {
                    cfg.inflow_rate_variation = next_u64!("--inflow-rate-variation")
                }
                "--pond-size-x" => cfg.pond_size_x = next_u64!("--pond-size-x") as usize,
                "--pond-size-y" => cfg.pond_size_y = next_u64!("--pond-size-y") as usize,
                "--pond-depth" => cfg.pond_depth = next_u64!("--pond-depth") as usize,
                "--failed-kill-penalty" => {
                    cfg.failed_kill_penalty = next_u64!("--failed-kill-penalty")
                }
                "--random-seed" => cfg.random_seed = next_u64!("--random-seed"),
                "--csv-path" => {
                    cfg.csv_path = Some(
                        it.next()
                            .ok_or(ConfigError::MissingValue("--csv-path"))?
                            .clone(),
                    )
                }
                "--viz" => cfg.viz_enabled = true,
                "--viz-path" => {
                    cfg.viz_path = it
                        .next()
                        .ok_or(ConfigError::MissingValue("--viz-path"))?
                        .clone()
                }
                "--viz-frequency" => cfg.viz_frequency = next_u64!("--viz-frequency"),
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.pond_size_x, 800);
        assert_eq!(cfg.pond_size_y, 600);
        assert_eq!(cfg.pond_depth, 1024);
        assert_eq!(cfg.random_seed, 13);
    }

    #[test]
    fn rejects_bad_depth() {
        let args = vec!["--pond-depth".to_string(), "1000".to_string()];
        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::DepthNotMultipleOf16(1000)));
    }

    #[test]
    fn parses_overrides() {
        let args = vec![
            "--random-seed".to_string(),
            "42".to_string(),
            "--viz".to_string(),
        ];
        let cfg = Config::from_args(args).unwrap();
        assert_eq!(cfg.random_seed, 42);
        assert!(cfg.viz_enabled);
    }

    #[test]
    fn rejects_unknown_flag() {
        let args = vec!["--not-a-real-flag".to_string()];
        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFlag(_)));
    }

    #[test]
    fn rejects_non_integer_value() {
        let args = vec!["--random-seed".to_string(), "abc".to_string()];
        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnInteger { .. }));
    }
}
