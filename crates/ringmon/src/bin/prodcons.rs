//! # Producer/Consumer Runner
//!
//! Runs a workload against one ring and verifies the result.
//!
//! ## Usage
//!
//! ```bash
//! prodcons --producers 4 --consumers 2 --messages 1000 --size 8
//! prodcons --config workload.toml
//! ```

use std::process::ExitCode;

use ringmon::{driver, DriverError, DriverResult, WorkloadConfig};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("Usage: prodcons [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -p, --producers <NUM>      Producer threads (default: 2)");
    println!("  -c, --consumers <NUM>      Consumer threads (default: 2)");
    println!("  -m, --messages <NUM>       Messages per producer (default: 100)");
    println!("  -s, --size <NUM>           Ring slots (default: 8)");
    println!("      --seed <NUM>           Jitter seed (default: 0)");
    println!("      --jitter-us <NUM>      Max pause between operations (default: 0)");
    println!("      --config <FILE>        Load settings from a TOML file first");
    println!("  -h, --help                 Show this help");
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> DriverResult<T> {
    let value = value.ok_or_else(|| DriverError::Config(format!("{flag} needs a value")))?;
    value
        .parse()
        .map_err(|_| DriverError::Config(format!("{flag}: cannot parse '{value}'")))
}

/// Reads a config file without validating it; flags may still fix it up.
fn load_base_config(path: &str) -> DriverResult<WorkloadConfig> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| DriverError::Config(format!("{path}: {e}")))
}

/// Parses arguments. `None` means help was printed.
///
/// The merged config is validated once, after every flag is applied. The
/// ring size is checked later, when the ring is built.
fn parse_args(args: &[String]) -> DriverResult<Option<WorkloadConfig>> {
    // A config file is the base; flags override it wherever they appear.
    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| DriverError::Config("--config needs a value".into()))?;
            load_base_config(path)?
        }
        None => WorkloadConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--producers" | "-p" => config.producers = parse_value(flag, value)?,
            "--consumers" | "-c" => config.consumers = parse_value(flag, value)?,
            "--messages" | "-m" => config.messages_per_producer = parse_value(flag, value)?,
            "--size" | "-s" => config.ring.size = parse_value(flag, value)?,
            "--seed" => config.seed = parse_value(flag, value)?,
            "--jitter-us" => config.max_jitter_us = parse_value(flag, value)?,
            "--config" => {}
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => return Err(DriverError::Config(format!("unknown option '{other}'"))),
        }
        i += 2;
    }

    config.validate()?;
    Ok(Some(config))
}

fn run() -> DriverResult<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(config) = parse_args(&args)? else {
        return Ok(());
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         RINGMON PRODUCER / CONSUMER                              ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Producers:          {}", config.producers);
    println!("│ Consumers:          {}", config.consumers);
    println!("│ Messages/producer:  {}", config.messages_per_producer);
    println!("│ Ring size:          {}", config.ring.size);
    println!("│ Jitter:             0..={} µs (seed {})", config.max_jitter_us, config.seed);
    println!("└─────────────────────────────────────────────────────────────────┘");
    println!();

    let report = driver::run(&config)?;

    println!("┌─ RESULTS ───────────────────────────────────────────────────────┐");
    for (c, count) in report.per_consumer_counts().iter().enumerate() {
        println!("│ Consumer {c:<3}        {count} slots");
    }
    println!("│ Total consumed:     {}", report.total_consumed());
    println!("│ Elapsed:            {:?}", report.elapsed);
    println!("│ Producer waits:     {}", report.stats.producer_waits);
    println!("│ Consumer waits:     {}", report.stats.consumer_waits);
    println!("│ High water mark:    {}", report.stats.high_water_mark);
    println!("└─────────────────────────────────────────────────────────────────┘");

    report.verify(&config)?;
    println!();
    println!("[OK] every slot consumed exactly once, per-producer order preserved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringmon_core::RingError;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("prodcons")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn temp_config_path() -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("test_prodcons_{id}.toml"))
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse_args(&args(&[])).unwrap().unwrap();
        assert_eq!(config, WorkloadConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let path = temp_config_path();
        std::fs::write(&path, "producers = 0\nconsumers = 5\n\n[ring]\nsize = 9\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        // The file alone is invalid; the flag repairs it, before or after --config.
        let before = parse_args(&args(&["-p", "3", "--config", &path_arg])).unwrap().unwrap();
        let after = parse_args(&args(&["--config", &path_arg, "--producers", "3"])).unwrap().unwrap();
        let unfixed = parse_args(&args(&["--config", &path_arg]));
        std::fs::remove_file(&path).ok();

        for config in [before, after] {
            assert_eq!(config.producers, 3);
            assert_eq!(config.consumers, 5);
            assert_eq!(config.ring.size, 9);
        }
        assert!(matches!(unfixed, Err(DriverError::Config(_))));
    }

    #[test]
    fn test_help_stops_parsing() {
        assert!(parse_args(&args(&["-p", "2", "--help"])).unwrap().is_none());
        assert!(parse_args(&args(&["-h"])).unwrap().is_none());
    }

    #[test]
    fn test_flag_without_value() {
        let err = parse_args(&args(&["--consumers"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid workload config: --consumers needs a value");
    }

    #[test]
    fn test_unparsable_value() {
        let err = parse_args(&args(&["-m", "lots"])).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[test]
    fn test_unknown_flag() {
        let err = parse_args(&args(&["--turbo", "1"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid workload config: unknown option '--turbo'");
    }

    #[test]
    fn test_negative_size_reaches_ring_check() {
        let config = parse_args(&args(&["--size", "-3"])).unwrap().unwrap();
        assert_eq!(config.ring.size, -3);

        let err = driver::run(&config).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Ring(RingError::CapacityTooSmall { requested: -3 })
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = parse_args(&args(&["--config", "/nonexistent/ringmon/workload.toml"])).unwrap_err();
        assert!(matches!(err, DriverError::Io(_)));
    }
}
