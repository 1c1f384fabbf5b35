use clap::Parser;
use tracing_subscriber::EnvFilter;

use keystash::cli::commands;
use keystash::cli::{output, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Unlock => commands::unlock::execute(&cli),
        Commands::Lock => commands::lock::execute(&cli),
        Commands::Status => commands::status::execute(&cli),
        Commands::Add {
            ref path,
            ref value,
        } => commands::add::execute(&cli, path, value.as_deref()),
        Commands::Update { ref path } => commands::update::execute(&cli, path),
        Commands::Get { ref path } => commands::get::execute(&cli, path),
        Commands::Copy { ref path, ttl } => commands::copy::execute(&cli, path, ttl),
        Commands::List => commands::list::execute(&cli),
        Commands::Search { ref keyword } => commands::search::execute(&cli, keyword),
        Commands::Inject { ref project } => commands::inject::execute(&cli, project),
        Commands::Reset { force } => commands::reset::execute(&cli, force),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr.  `RUST_LOG` wins over `-v` when set.
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
