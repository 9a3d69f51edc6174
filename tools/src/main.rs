//! sim-runner: headless host for the multi-zone SIR engine.
//!
//! Usage:
//!   sim-runner --seed 12345 --data-dir ./data
//!   sim-runner --seed 12345 --preset --paced
//!   sim-runner --seed 12345 --ipc-mode

use anyhow::Result;
use chrono::{DateTime, Utc};
use epidemic_core::{
    clock::DriverState,
    command::SimCommand,
    config::SimConfig,
    engine::{SimEngine, TickOutcome},
    history::RunHistory,
    report::{RunSummary, TickReport},
    types::new_run_id,
    zone::ZoneSpec,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    Tick { count: u64 },
    Command { cmd: SimCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    run_id: &'a str,
    simulation_number: u32,
    state: DriverState,
    beta: f64,
    gamma: f64,
    r0: f64,
    tick_interval_ms: u64,
    report: Option<&'a TickReport>,
    history: &'a RunHistory,
    summary: Option<&'a RunSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let paced = args.iter().any(|a| a == "--paced");
    let preset = args.iter().any(|a| a == "--preset");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let mut config = load_config(data_dir)?;
    if preset {
        config.zones = Some(ZoneSpec::santa_cruz_preset());
    }

    let run_id = new_run_id();
    let mut engine = SimEngine::build(run_id.clone(), seed, config)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        let started_at = Utc::now();
        println!("sim-runner: multi-zone SIR simulation");
        println!("  run_id:    {run_id}");
        println!("  seed:      {seed}");
        println!("  data_dir:  {data_dir}");
        println!("  started:   {}", started_at.to_rfc3339());
        println!();
        print_zones(&engine);

        let summary = if paced {
            run_paced(&mut engine)?
        } else {
            engine.run_to_completion()?
        };
        print_summary(&engine, &summary, started_at);
    }

    Ok(())
}

/// Missing config file falls back to the built-in defaults.
fn load_config(data_dir: &str) -> Result<SimConfig> {
    if Path::new(data_dir).join("sim_config.json").exists() {
        SimConfig::load(data_dir)
    } else {
        log::warn!("No sim_config.json under {data_dir}, using defaults");
        Ok(SimConfig::default())
    }
}

/// One tick per interval, printing a line per simulated day.
fn run_paced(engine: &mut SimEngine) -> Result<RunSummary> {
    engine.start()?;
    loop {
        match engine.tick()? {
            TickOutcome::Advanced(report) => {
                if report.day.fract() == 0.0 {
                    println!(
                        "  day {:>5.1} | I={:>10.0} | integral={:>10.0} | err={:>5.2}% | R0={:.2}",
                        report.day,
                        report.totals.i,
                        report.integral_estimate,
                        report.relative_error_pct,
                        report.r0
                    );
                }
            }
            TickOutcome::Completed(summary) => return Ok(summary),
        }
        std::thread::sleep(engine.tick_interval());
    }
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let outcome = match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => Ok(()),
            IpcRequest::Tick { count } => engine.run_ticks(count).map(|_| ()),
            IpcRequest::Command { cmd } => engine.apply(cmd),
        };

        match outcome {
            Ok(()) => {
                let state = build_ui_state(engine);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            // Rejected commands are reported, the session goes on.
            Err(e) => write_error(&mut stdout, &e.to_string())?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState<'_> {
    let params = engine.params();
    UiState {
        run_id: &engine.run_id,
        simulation_number: engine.simulation_number(),
        state: engine.state(),
        beta: params.beta,
        gamma: params.gamma,
        r0: params.r0(),
        tick_interval_ms: engine.clock.tick_interval_ms(),
        report: engine.last_report(),
        history: engine.history(),
        summary: engine.summary(),
    }
}

fn print_zones(engine: &SimEngine) {
    println!("=== ZONES (simulation #{}) ===", engine.simulation_number());
    for z in engine.zones() {
        println!(
            "  {:<20} N={:>9} I0={:>5} day={:>4} at ({:.4}, {:.4})",
            z.spec.name,
            z.spec.population,
            z.spec.initial_infected,
            z.spec.day_start,
            z.spec.position.lat,
            z.spec.position.lng
        );
    }
    println!();
}

fn print_summary(engine: &SimEngine, summary: &RunSummary, started_at: DateTime<Utc>) {
    let elapsed = Utc::now() - started_at;
    let violations = engine.event_log().of_type("conservation_violated").count();
    let params = engine.params();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", engine.run_id);
    println!("  ticks run:       {}", summary.ticks);
    println!("  final day:       {:.1}", summary.final_day);
    println!("  beta / gamma:    {:.2} / {:.2} (R0 = {:.2})", params.beta, params.gamma, params.r0());
    println!("  population:      {}", summary.population);
    println!("  susceptible:     {:.0} ({:.1}%)", summary.totals.s, summary.susceptible_pct);
    println!("  infected:        {:.0} ({:.2}%)", summary.totals.i, summary.infected_pct);
    println!("  recovered:       {:.0} ({:.1}%)", summary.totals.r, summary.recovered_pct);
    println!("  peak infected:   {:.0} (day {:.1})", summary.peak_infected, summary.peak_day);
    println!("  conservation:    {violations} violation(s)");
    println!("  wall time:       {} ms", elapsed.num_milliseconds());

    if let Some(report) = engine.last_report() {
        println!();
        println!("=== INTEGRAL CROSS-CHECK (day {:.1}) ===", report.day);
        println!("  I Euler:         {:.0}", report.totals.i);
        println!("  I integral:      {:.0}", report.integral_estimate);
        println!("  relative error:  {:.2}% ({:?})", report.relative_error_pct, report.agreement);
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
