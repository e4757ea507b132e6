use anyhow::Result;
use clap::Parser;
use engine::{FixLoop, GoToolchain};
use gostep::config::{CliArgs, ReplConfig};
use gostep::repl::Repl;
use gostep::workspace::Workspace;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = ReplConfig::from_args(&args);

    // Ctrl-C kills whatever the current turn is running; the prompt itself
    // sees Ctrl-C as a key press.
    let interrupt = Arc::new(Notify::new());
    let notifier = interrupt.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            notifier.notify_waiters();
        }
    });

    let toolchain = GoToolchain::new(config.toolchain.clone(), interrupt);
    let workspace = match &args.file {
        Some(path) => Workspace::from_file(path)?,
        None => Workspace::scratch(&toolchain).await?,
    };
    info!(
        file = %workspace.file_path().display(),
        dir = %workspace.working_dir().display(),
        placement = %config.fix.placement,
        max_fix_passes = config.fix.max_fix_passes,
        "session starting"
    );

    let limits = toolchain.limits();
    let mut repl = Repl::new(
        FixLoop::new(toolchain, config.fix.clone()),
        workspace.session(),
        limits,
    );
    let result = repl.run(config.history_path.as_deref()).await;

    // Restore the user's file or remove the scratch module before exiting
    drop(repl);
    drop(workspace);
    result
}
