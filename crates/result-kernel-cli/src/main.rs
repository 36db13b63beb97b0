use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use result_kernel_api::{LookupRequest, ResultLookupApi};
use result_kernel_core::{Branch, LookupPolicy};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "rk")]
#[command(about = "Result Kernel CLI")]
struct Cli {
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Reject unrecognized branch hints and pin hinted searches to that
    /// branch alone.
    #[arg(long, default_value_t = false)]
    strict_branch_hint: bool,

    /// Emit the college roll number field in lookup output.
    #[arg(long, default_value_t = false)]
    include_college_roll: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a registration identifier across branch collections.
    Lookup(LookupArgs),
    /// Report backing-store presence for every catalog branch.
    Branches,
    /// Print the subject table of one branch.
    Subjects(SubjectsArgs),
}

#[derive(Debug, Args)]
struct LookupArgs {
    #[arg(long)]
    reg: String,
    #[arg(long)]
    branch: Option<String>,
}

#[derive(Debug, Args)]
struct SubjectsArgs {
    #[arg(long)]
    branch: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let policy = LookupPolicy {
        strict_branch_hint: cli.strict_branch_hint,
        include_college_roll: cli.include_college_roll,
    };
    let api = ResultLookupApi::new(cli.data_dir, policy);

    match cli.command {
        Command::Lookup(args) => {
            let response = api
                .lookup(LookupRequest { registration: args.reg, branch: args.branch })?;
            emit_json(&response)
        }
        Command::Branches => emit_json(&api.branches()),
        Command::Subjects(args) => {
            let branch = Branch::parse(&args.branch)
                .ok_or_else(|| anyhow!("unknown branch: {}", args.branch))?;
            emit_json(&api.subjects(branch))
        }
    }
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
