use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::LoadReport;
use crate::cycle::{CycleReport, LearningSummary};

#[derive(Parser)]
#[command(name = "spark")]
#[command(version = "0.1.0")]
#[command(about = "Agent runtime with LLM-backed agents and evaluation cycles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding default.toml and environment overrides
    #[arg(short, long, default_value = "config", env = "SPARK_CONFIG_DIR")]
    pub config: PathBuf,

    /// Root every storage path (agent memory, agent logs, cycle log) here
    #[arg(long, env = "SPARK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered agents
    Agents,
    /// Run one task on an agent
    Run {
        /// Agent name (case-insensitive)
        agent: String,
        /// Task text
        #[arg(trailing_var_arg = true)]
        task: Vec<String>,
    },
    /// Run a cycle protocol on the reflective agent
    Mode {
        /// short, medium, long or auto
        mode: String,
        /// Optional task text
        #[arg(trailing_var_arg = true)]
        task: Vec<String>,
    },
    /// Run one evaluation cycle, or keep running until Ctrl-C
    Cycle {
        #[arg(long)]
        repeat: bool,
        /// Stop after this many attempted cycles (failed ones count) when repeating
        #[arg(long)]
        max: Option<usize>,
    },
    /// Show learning aggregates over recent cycles
    Learn {
        #[arg(short, long)]
        window: Option<usize>,
    },
    /// Print the effective configuration
    Config,
}

pub fn join_task(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

pub fn print_agents(names: &[String], report: &LoadReport) {
    println!("Registered agents ({}):", names.len());
    for name in names {
        println!("  - {}", name);
    }
    for (name, reason) in &report.skipped {
        println!("  ! {} skipped: {}", name, reason);
    }
}

pub fn print_learning(summary: &LearningSummary) {
    println!("Learning over {} cycle(s):", summary.window);
    println!("  avg profit : {:.4}", summary.performance.avg_profit);
    println!("  trend      : {}", summary.performance.trend);
    let patterns: Vec<String> = summary.patterns.iter().map(|p| p.to_string()).collect();
    println!("  patterns   : [{}]", patterns.join(", "));
    println!("  suggestion : {}", summary.suggestion);
    println!("  model      : {}", summary.model_update.status);
}

pub fn print_cycle_report(report: &CycleReport) {
    println!("Cycle {} ({} ms)", report.cycle_id, report.elapsed_ms);
    println!("--- signals ---\n{}", report.record.signals);
    println!("--- strategy ---\n{}", report.record.strategy);
    println!(
        "--- simulation ---\nstatus={} profit={}",
        report.record.results.status,
        report
            .record
            .results
            .profit
            .map(|p| p.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("--- adaptation ---\n{}", report.feedback);
    print_learning(&report.learning);
}
