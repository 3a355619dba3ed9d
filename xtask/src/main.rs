use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};

const LOCAL_ENDPOINT: &str = "http://localhost:8000";
const LOCAL_CONTAINER: &str = "table-count-dynamodb";
const LOCAL_IMAGE: &str = "amazon/dynamodb-local:latest";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Developer tasks for the table count workspace",
    long_about = "Runs the counter against a local DynamoDB, manages that local\n\
                  instance, and bundles the checks CI runs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count a table; defaults to the local DynamoDB endpoint
    Count {
        #[arg(long)]
        table: String,
        #[arg(long, default_value = LOCAL_ENDPOINT)]
        endpoint: String,
        #[arg(long, default_value_t = 4)]
        segments: u32,
        #[arg(long, default_value_t = 500)]
        limit: u32,
    },
    /// Start or stop a DynamoDB Local container on port 8000
    LocalDb {
        #[arg(value_enum)]
        action: LocalDbAction,
    },
    /// Run the aggregation benchmarks
    Bench,
    /// Run the checks CI runs
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LocalDbAction {
    Up,
    Down,
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// fmt, clippy and every crate's tests
    Check,
    Bench,
    All,
}

fn announce(label: &str) {
    eprintln!("\n--> {label}");
}

fn run(program: &str, args: &[&str]) {
    eprintln!("$ {program} {}", args.join(" "));
    let status = match Command::new(program).args(args).status() {
        Ok(status) => status,
        Err(error) => {
            eprintln!("could not start {program}: {error}");
            exit(1);
        }
    };
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn count(table: &str, endpoint: &str, segments: u32, limit: u32) {
    let segments = segments.to_string();
    let limit = limit.to_string();
    run(
        "cargo",
        &[
            "run",
            "--release",
            "-p",
            "count_dynamodb",
            "--bin",
            "table_count",
            "--",
            "--table",
            table,
            "--endpoint",
            endpoint,
            "--segments",
            &segments,
            "--limit",
            &limit,
        ],
    );
}

fn local_db(action: LocalDbAction) {
    match action {
        LocalDbAction::Up => {
            announce("Starting DynamoDB Local");
            run(
                "docker",
                &[
                    "run",
                    "--rm",
                    "--detach",
                    "--name",
                    LOCAL_CONTAINER,
                    "--publish",
                    "8000:8000",
                    LOCAL_IMAGE,
                ],
            );
            eprintln!("DynamoDB Local listening on {LOCAL_ENDPOINT}");
        }
        LocalDbAction::Down => {
            announce("Stopping DynamoDB Local");
            run("docker", &["stop", LOCAL_CONTAINER]);
        }
    }
}

fn check() {
    announce("rustfmt");
    run("cargo", &["fmt", "--all", "--", "--check"]);

    announce("clippy");
    run(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    );

    announce("tests");
    run("cargo", &["test", "--workspace"]);
}

fn bench() {
    announce("aggregation benchmarks");
    run("cargo", &["bench", "-p", "count_core", "--bench", "aggregation"]);
}

fn main() {
    match Cli::parse().command {
        Commands::Count {
            table,
            endpoint,
            segments,
            limit,
        } => count(&table, &endpoint, segments, limit),
        Commands::LocalDb { action } => local_db(action),
        Commands::Bench => bench(),
        Commands::Ci { job } => match job {
            CiJob::Check => check(),
            CiJob::Bench => bench(),
            CiJob::All => {
                check();
                bench();
            }
        },
    }
}
