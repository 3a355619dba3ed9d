use std::process::ExitCode;

use clap::Parser;
use count_core::{BarProgress, CancelFlag, ProgressReporter, ScanCoordinator, ScanPlan, SilentProgress};
use count_dynamodb::adapters::dynamodb::DynamoDbStore;
use count_dynamodb::cli::Cli;
use count_dynamodb::error::AppError;
use count_dynamodb::logging::init_tracing;
use count_dynamodb::output::render_report;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

fn run(cli: &Cli) -> Result<String, AppError> {
    let plan = ScanPlan::new(cli.segments, cli.limit)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let abort_calls = CancellationToken::new();
    let store = runtime
        .block_on(DynamoDbStore::connect(
            &cli.store_settings(),
            runtime.handle().clone(),
        ))
        .with_cancellation(abort_calls.clone());

    let cancel = CancelFlag::default();
    let on_interrupt = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; aborting in-flight calls and stopping segments");
            on_interrupt.cancel();
            abort_calls.cancel();
        }
    });

    let progress: Box<dyn ProgressReporter> = if cli.silent {
        Box::new(SilentProgress)
    } else {
        println!(
            "Checking if table {} exists and or waiting to be created...",
            cli.table
        );
        Box::new(BarProgress::new().with_intro(format!(
            "Counting records for table {} on region {}...",
            cli.table, cli.region
        )))
    };

    let report = ScanCoordinator::new(&store, plan, progress.as_ref())
        .with_cancel_flag(cancel)
        .run()?;

    Ok(render_report(&report, cli.format, cli.silent)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.default_log_directive());

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(%error, table = %cli.table, "table count failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
