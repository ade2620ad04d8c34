use clap::{Parser, Subcommand};
use color_eyre::{Report, Result};

mod api;
mod clientconfig;
#[cfg(feature = "docgen")]
mod cli_json;
mod create;
mod manifest;
mod params;
mod quantity;
mod utils;

/// Command line client for KubeVirt.
///
/// The `create` commands generate manifests of KubeVirt objects from a few
/// flags. They only print YAML; pipe it into `kubectl create -f -` to
/// create the objects in the cluster.
#[derive(Parser)]
#[command(name = "virtctl", version)]
struct Cli {
    #[command(flatten)]
    client: clientconfig::ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

/// Internal diagnostic and tooling commands for development
#[derive(Parser)]
struct InternalsOpts {
    #[command(subcommand)]
    command: InternalsCmds,
}

#[derive(Subcommand)]
enum InternalsCmds {
    /// Dump CLI structure as JSON for man page generation
    #[cfg(feature = "docgen")]
    DumpCliJson,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a manifest for the specified kind
    #[clap(subcommand)]
    Create(create::CreateCommands),

    /// Internal diagnostic and tooling commands for development
    #[clap(hide = true)]
    Internals(InternalsOpts),
}

/// Install and configure the tracing/logging system.
///
/// Logs go to stderr so they never mix with the manifest on stdout. They are
/// filtered by the RUST_LOG environment variable, defaulting to 'warn'.
fn install_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<(), Report> {
    install_tracing();
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Create(cmd) => cmd.run(&cli.client)?,
        Commands::Internals(opts) => match opts.command {
            #[cfg(feature = "docgen")]
            InternalsCmds::DumpCliJson => {
                let json = cli_json::dump_cli_json()?;
                println!("{}", json);
            }
        },
    }
    Ok(())
}
