//! desk-runner: headless driver for the complaint desk.
//!
//! Usage:
//!   desk-runner --db desk.db --config data/desk.json
//!   desk-runner --db desk.db --ipc-mode
//!
//! In IPC mode every stdin line is one JSON request (see `api::Request`) and
//! every stdout line is `{ "status": u16, "body": ... }`.

use anyhow::{Context, Result};
use complaint_desk_core::{api, config::DeskConfig, ComplaintDesk};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let config_path = arg_value(&args, "--config").unwrap_or("data/desk.json");

    let config = if Path::new(config_path).exists() {
        DeskConfig::load(config_path)?
    } else {
        log::warn!("config {config_path} not found, using defaults");
        DeskConfig::default()
    };

    if !ipc_mode {
        println!("Complaint desk - desk-runner");
        println!("  db:      {db}");
        println!("  config:  {config_path}");
        println!();
    }

    let desk = ComplaintDesk::open(db, config).with_context(|| format!("cannot open {db}"))?;

    if ipc_mode {
        run_ipc_loop(&desk)?;
    } else {
        print_summary(&desk)?;
    }
    Ok(())
}

fn run_ipc_loop(desk: &ComplaintDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() == "quit" {
            break;
        }
        let response = api::handle_json(desk, &line);
        log::debug!("request -> {}", response.status);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(desk: &ComplaintDesk) -> Result<()> {
    let municipalities = desk.municipalities().list()?;
    let complaints = desk.store().complaint_count()?;
    let audit = desk.audit()?;

    println!("=== DESK SUMMARY ===");
    println!("  complaints:     {complaints}");
    println!("  municipalities: {}", municipalities.len());
    for m in &municipalities {
        match (m.average_rating, m.total_ratings) {
            (Some(avg), Some(total)) => {
                println!("    {:>4} {:<24} {avg:.1} ({total} ratings)", m.id, m.name)
            }
            _ => println!("    {:>4} {:<24} (no ratings)", m.id, m.name),
        }
    }
    println!();
    if audit.is_consistent() {
        println!("  audit:          consistent");
    } else {
        println!(
            "  audit:          {} support / {} aggregate mismatches",
            audit.support_mismatches.len(),
            audit.aggregate_mismatches.len()
        );
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
