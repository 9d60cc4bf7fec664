//! Battery pack controller simulator.
//!
//! Runs the scripted walkthroughs against a randomized pack and narrates
//! every state transition.
//!
//! Usage:
//!   cargo run -p pack_bms_sim --bin bms_sim -- [OPTIONS]
//!
//! Options:
//!   -s, --scenario <NAME>    Scenario to run, or "all" (default: all)
//!   --seed <N>               RNG seed for reproducible runs (default: random)
//!   --tick-ms <MS>           Simulated time per tick (default: 100)
//!   -p, --param <NAME=VAL>   Override a controller parameter (repeatable)
//!   -l, --list               List scenarios and parameters

use std::env;
use std::process;

use pack_bms_sim::{
    default_store, load_params, Harness, HarnessConfig, Scenario, ScenarioReport, SimConfig,
    SimError, SimulatedPack,
};

struct Args {
    scenarios: Vec<Scenario>,
    seed: Option<u64>,
    tick_ms: u64,
    params: Vec<String>,
    list: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        scenarios: Scenario::ALL.to_vec(),
        seed: None,
        tick_ms: HarnessConfig::default().tick_ms,
        params: Vec::new(),
        list: false,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "-s" | "--scenario" => {
                i += 1;
                let name = require_value(&raw, i, "scenario");
                args.scenarios = if name == "all" {
                    Scenario::ALL.to_vec()
                } else {
                    match name.parse() {
                        Ok(scenario) => vec![scenario],
                        Err(e) => fail(&e),
                    }
                };
            }
            "--seed" => {
                i += 1;
                args.seed = Some(parse_u64_arg(&raw, i, "seed"));
            }
            "--tick-ms" => {
                i += 1;
                args.tick_ms = parse_u64_arg(&raw, i, "tick-ms");
            }
            "-p" | "--param" => {
                i += 1;
                args.params.push(require_value(&raw, i, "param").to_string());
            }
            "-l" | "--list" => args.list = true,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if args.tick_ms == 0 {
        eprintln!("Error: tick-ms must be at least 1");
        process::exit(1);
    }

    args
}

fn require_value<'a>(raw: &'a [String], i: usize, name: &str) -> &'a str {
    raw.get(i).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Error: --{name} requires a value");
        process::exit(1);
    })
}

fn parse_u64_arg(raw: &[String], i: usize, name: &str) -> u64 {
    require_value(raw, i, name).parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for --{name}");
        process::exit(1);
    })
}

fn fail(error: &SimError) -> ! {
    eprintln!("Error: {error}");
    process::exit(1);
}

fn print_usage() {
    eprintln!(
        "Usage: bms_sim [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 -s, --scenario <NAME>    Scenario to run, or \"all\" (default: all)\n\
         \x20 --seed <N>               RNG seed for reproducible runs (default: random)\n\
         \x20 --tick-ms <MS>           Simulated time per tick (default: 100)\n\
         \x20 -p, --param <NAME=VAL>   Override a controller parameter (repeatable)\n\
         \x20 -l, --list               List scenarios and parameters\n\
         \x20 -h, --help               Show this help"
    );
}

fn print_list() -> Result<(), SimError> {
    println!("Scenarios:");
    for scenario in Scenario::ALL {
        println!("  {:<20} {}", scenario.name(), scenario.description());
    }

    let store = default_store()?;
    println!();
    println!("Parameters:");
    for (name, value) in store.iter() {
        println!("  {:<14} {}", name, value.as_f64());
    }
    Ok(())
}

fn print_report(report: &ScenarioReport, config: &HarnessConfig) {
    for t in &report.transitions {
        let seconds = config.seconds_at(t.tick);
        println!(
            "  [{seconds:>8.1}s] {:<20} -> {:<20} ({})",
            t.from.name(),
            t.to.name(),
            t.trigger.name()
        );
    }

    let t = &report.telemetry;
    println!(
        "  final: {} after {} ticks | V={:.3} I={:.2} T={:.3} SOC={:.1} OCV={:.3}",
        report.final_state.name(),
        report.ticks,
        t.voltage,
        t.current,
        t.temp_proxy_voltage,
        t.soc,
        t.ocv
    );
    if report.fatal_shutdown {
        println!("  shutdown cause: fatal fault");
    }
}

fn main() {
    let args = parse_args();

    if args.list {
        if let Err(e) = print_list() {
            fail(&e);
        }
        return;
    }

    let params = load_params(&args.params).unwrap_or_else(|e| fail(&e));
    let config = HarnessConfig {
        tick_ms: args.tick_ms,
        ..HarnessConfig::default()
    };

    println!("=== pack_bms Simulator ===");
    match args.seed {
        Some(seed) => println!("Seed: {seed}, tick: {} ms", args.tick_ms),
        None => println!("Seed: random, tick: {} ms", args.tick_ms),
    }
    println!();

    let mut failures = 0;
    for (index, scenario) in args.scenarios.iter().enumerate() {
        println!("--- {scenario}: {} ---", scenario.description());

        let sim_config = SimConfig {
            seed: args.seed.map(|seed| seed.wrapping_add(index as u64)),
            ..SimConfig::default()
        };
        let mut harness = match Harness::new(SimulatedPack::new(sim_config), params, config) {
            Ok(harness) => harness,
            Err(e) => fail(&e),
        };

        match scenario.run(&mut harness) {
            Ok(report) => {
                print_report(&report, &config);
                println!("  PASSED");
            }
            Err(e) => {
                for t in harness.transitions() {
                    println!("  {} -> {} ({})", t.from.name(), t.to.name(), t.trigger.name());
                }
                println!("  FAILED: {e}");
                failures += 1;
            }
        }
        println!();
    }

    if failures > 0 {
        eprintln!("{failures} scenario(s) failed");
        process::exit(1);
    }
    println!("All scenarios passed");
}
