//! Shared internals for the bcp tools: block model, chunking policy, the
//! storage-provider contract, the local filesystem backend and the transfer
//! pipeline, plus the runtime/logging harness used by every binary.

pub mod chunk;
pub mod config;
pub mod errors;
pub mod fs;
pub mod object;
pub mod provider;
pub mod transfer;

pub use config::{OutputConfig, RuntimeConfig};
pub use errors::TransferError;

fn init_tracing(output: &OutputConfig) {
    let level = match output.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up tracing and the tokio runtime, runs `func` to completion and
/// reports the outcome.
///
/// Returns `None` if the operation failed (the error has already been
/// logged unless `quiet` was set) - callers turn that into a non-zero exit
/// code; no library component terminates the process itself.
pub fn run<Fut, Summary>(
    output: &OutputConfig,
    runtime: &RuntimeConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
    Summary: std::fmt::Display,
{
    init_tracing(output);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    let rt = match builder.enable_all().build() {
        Ok(rt) => rt,
        Err(error) => {
            if !output.quiet {
                eprintln!("failed to start the async runtime: {error:#}");
            }
            return None;
        }
    };
    match rt.block_on(func()) {
        Ok(summary) => {
            if output.print_summary {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            if !output.quiet {
                eprintln!("{error:#}");
            }
            None
        }
    }
}
