use anyhow::{anyhow, Context};
use clap::Parser;

use bcp_tools_bcp::{config, path::TransferPath, resolve, Config};
use common::provider::StorageProvider;
use common::transfer;
use gate::Gate;

const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bcp",
    version,
    about = "Copy files to blob storage in parallel chunks - like `cp`, but each file is split into blocks uploaded concurrently",
    long_about = "`bcp` copies local files to a blob container (or another local path), splitting \
each file into fixed-size blocks that are uploaded concurrently and committed atomically - the \
object becomes visible only when every block landed.

Remote destinations are addressed through aliases configured in `.bcp.toml`:

EXAMPLES:
    # Generate a config skeleton to fill in
    bcp --init

    # Copy one file to the container behind the `backup` alias
    bcp report.bin //backup/reports/report.bin

    # Copy several files into a prefix (note the trailing slash)
    bcp *.log //backup/logs/ --summary

    # Larger blocks, capped concurrency
    bcp big.img //backup/big.img --block-size 64MiB --max-concurrency 8"
)]
struct Args {
    // Transfer options
    /// Block size for chunked uploads (e.g. "4MiB"); clamped to provider bounds
    #[arg(long, value_name = "SIZE", help_heading = "Transfer options")]
    block_size: Option<bytesize::ByteSize>,

    /// Maximum concurrent block uploads per file (0 = number of CPU cores x 10)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Transfer options"
    )]
    max_concurrency: usize,

    // Configuration
    /// Path to the config file (default: .bcp.toml in cwd, then home directory)
    #[arg(long, value_name = "PATH", help_heading = "Configuration")]
    config: Option<std::path::PathBuf>,

    /// Write a skeleton .bcp.toml and exit; refuses to overwrite an existing file
    #[arg(long, help_heading = "Configuration")]
    init: bool,

    // Progress & output
    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Advanced settings
    /// Number of worker threads (0 = number of CPU cores)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,

    // ARGUMENTS
    /// Source path(s) and destination path
    #[arg()]
    paths: Vec<String>,
}

fn load_config(args: &Args, needed: bool) -> anyhow::Result<Config> {
    let Some(path) = config::find_config(args.config.as_deref()) else {
        if needed {
            return Err(anyhow!(
                "no {} found (searched the working and home directories); \
                run `bcp --init` to generate one",
                config::CONFIG_FILE_NAME
            ));
        }
        return Ok(Config::default());
    };
    Config::load(&path)
}

async fn async_main(args: Args) -> anyhow::Result<transfer::Summary> {
    if args.paths.len() < 2 {
        return Err(anyhow!(
            "you must specify at least one source path and one destination path"
        ));
    }
    let (dst_raw, src_raw) = args.paths.split_last().unwrap();
    let sources = src_raw
        .iter()
        .map(|raw| TransferPath::parse(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if sources.iter().any(TransferPath::is_aliased) {
        return Err(anyhow!(
            "copying from an aliased location is not supported, sources must be local files"
        ));
    }
    let dst = TransferPath::parse(dst_raw)?;
    if sources.len() > 1 && !dst.is_prefix() {
        return Err(anyhow!(
            "multiple sources can only be copied INTO a container prefix or directory; \
            follow the destination path with a trailing slash"
        ));
    }
    // configuration is only required when the destination is aliased
    let config = load_config(&args, dst.is_aliased())?;
    let block_size = match args.block_size {
        Some(size) => size.0 as usize,
        None => config.default_block_size()?.unwrap_or(DEFAULT_BLOCK_SIZE),
    };
    let max_concurrency = match args.max_concurrency {
        0 => config.max_concurrency.unwrap_or_else(Gate::default_size),
        n => n,
    };
    let settings = transfer::Settings {
        block_size,
        max_concurrency,
    };
    let target = resolve(&dst, &config)?;
    tracing::debug!("destination provider: {}", target.provider.kind());
    let source_provider = common::fs::FilesystemProvider;

    let mut summary = transfer::Summary::default();
    for (raw, parsed) in src_raw.iter().zip(&sources) {
        let TransferPath::Local(src_path) = parsed else {
            unreachable!("aliased sources were rejected above");
        };
        let info = source_provider
            .stat(src_path)
            .await
            .with_context(|| format!("source {src_path:?}"))?;
        if info.is_dir {
            tracing::warn!("skipping directory {:?}", raw);
            continue;
        }
        let dst_name = if dst.is_prefix() {
            format!("{}{}", target.path, info.name)
        } else {
            target.path.clone()
        };
        summary = summary
            + transfer::transfer(
                &source_provider,
                target.provider.as_ref(),
                src_path,
                &dst_name,
                &settings,
            )
            .await
            .with_context(|| format!("failed to copy {src_path:?} to {dst_name:?}"))?;
    }
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.init {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from(config::CONFIG_FILE_NAME));
        config::write_skeleton(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
    };
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    if common::run(&output, &runtime, func).is_none() {
        std::process::exit(1);
    }
    Ok(())
}
