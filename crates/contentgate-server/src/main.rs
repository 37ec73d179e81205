use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contentgate_search::options::parse_order_by;
use contentgate_search::{QueryExpressionTranslator, QueryOptions};
use contentgate_server::config::loader::load_config;
use contentgate_server::observability::{apply_logging_config, init_tracing};

#[derive(Parser)]
#[command(name = "contentgate")]
#[command(about = "ContentGate operation dispatch and query translation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./contentgate.toml)
    #[arg(short, long, global = true, env = "CONTENTGATE_CONFIG")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as TOML
    Config,
    /// Translate a collection request into the canonical content query
    Translate(TranslateArgs),
}

#[derive(clap::Args)]
struct TranslateArgs {
    /// OData $filter expression
    #[arg(long)]
    filter: Option<String>,

    /// Scope path (e.g. /Root/IMS/BuiltIn/Portal)
    #[arg(long)]
    scope: Option<String>,

    #[arg(long)]
    top: Option<usize>,

    #[arg(long)]
    skip: Option<usize>,

    /// OData $orderby (e.g. "Name, CreationDate desc")
    #[arg(long)]
    orderby: Option<String>,
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load_config(cli.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;
    apply_logging_config(&cfg.logging);

    match cli.command {
        Commands::Config => {
            print!("{}", cfg.to_toml().map_err(anyhow::Error::msg)?);
        }
        Commands::Translate(args) => {
            let mut options = QueryOptions::new();
            options.top = args.top;
            options.skip = args.skip;
            if let Some(order_by) = args.orderby.as_deref() {
                options.order_by = parse_order_by(order_by)?;
            }

            let translator = QueryExpressionTranslator::new().with_max_top(cfg.search.max_top);
            let query = translator.translate(
                None,
                args.filter.as_deref(),
                args.scope.as_deref(),
                &options,
            )?;
            println!("{query}");
        }
    }
    Ok(())
}
