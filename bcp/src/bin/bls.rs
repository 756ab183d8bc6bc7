use anyhow::anyhow;
use clap::Parser;

use bcp_tools_bcp::{config, path::TransferPath, resolve, Config};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bls",
    version,
    about = "List objects in blob storage or on the local filesystem",
    long_about = "`bls` lists objects matching a pattern. Local patterns use shell-style \
wildcards; aliased container patterns (`//alias/prefix`) match on the literal prefix up to \
the first wildcard.

EXAMPLES:
    # List everything under a prefix in the `backup` alias
    bls //backup/reports/

    # Long listing with type, modification time, etag and size
    bls -l //backup/reports/

    # Local shell-style glob
    bls '/var/log/*.log'"
)]
struct Args {
    // Output options
    /// Long listing: object type, modification time, etag, size and name
    #[arg(short = 'l', long = "long", help_heading = "Output options")]
    long: bool,

    /// Don't print the header line in long listings
    #[arg(short = 'n', long = "no-header", help_heading = "Output options")]
    no_header: bool,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Output options")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Output options")]
    quiet: bool,

    // Configuration
    /// Path to the config file (default: .bcp.toml in cwd, then home directory)
    #[arg(long, value_name = "PATH", help_heading = "Configuration")]
    config: Option<std::path::PathBuf>,

    // ARGUMENTS
    /// Pattern to match: a local glob or an aliased prefix like //alias/prefix
    #[arg(value_name = "PATTERN")]
    pattern: String,
}

struct Listed {
    objects: usize,
}

impl std::fmt::Display for Listed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "objects listed: {}", self.objects)
    }
}

fn timestamp(info: &common::object::ObjectInfo) -> String {
    info.last_modified
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

async fn async_main(args: Args) -> anyhow::Result<Listed> {
    let pattern = TransferPath::parse(&args.pattern)?;
    let config = if pattern.is_aliased() {
        let path = config::find_config(args.config.as_deref()).ok_or_else(|| {
            anyhow!(
                "no {} found (searched the working and home directories); \
                run `bcp --init` to generate one",
                config::CONFIG_FILE_NAME
            )
        })?;
        Config::load(&path)?
    } else {
        Config::default()
    };
    let endpoint = resolve(&pattern, &config)?;
    let mut objects = endpoint.provider.glob(&endpoint.path).await?;
    objects.sort_by(|a, b| a.name.cmp(&b.name));
    if args.long {
        if !args.no_header {
            println!(
                "{:<12} {:<19} {:<20} {:>14} name",
                "type", "modified", "etag", "size"
            );
        }
        for info in &objects {
            println!(
                "{:<12} {:<19} {:<20} {:>14} {}",
                if info.object_type.is_empty() { "-" } else { info.object_type.as_str() },
                timestamp(info),
                if info.etag.is_empty() { "-" } else { info.etag.as_str() },
                info.length,
                info.name
            );
        }
    } else {
        for info in &objects {
            println!("{}", info.name);
        }
    }
    Ok(Listed {
        objects: objects.len(),
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: false,
    };
    let runtime = common::RuntimeConfig { max_workers: 0 };
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    if common::run(&output, &runtime, func).is_none() {
        std::process::exit(1);
    }
    Ok(())
}
