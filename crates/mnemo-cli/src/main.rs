mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mnemo",
    about = "Index, search and lint a directory of markdown skill notes",
    version,
    propagate_version = true
)]
struct Cli {
    /// Notes root (default: auto-detect from .mnemo/, plugins/ or .git/)
    #[arg(long, global = true, env = "MNEMO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search notes by free text, optionally narrowed by filters
    Search {
        /// Whitespace-separated terms; omit to list everything the filters admit
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Source project named in the note header
        #[arg(long)]
        source: Option<String>,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one note's metadata and related skills
    Show {
        /// Note path relative to the root, with or without extension
        path: String,
    },

    /// List notes in path order
    List {
        #[arg(long)]
        category: Option<String>,
    },

    /// Show every tag with its note count
    Tags,

    /// Check notes against the catalog's publishing rules
    Validate,

    /// Write the marketplace index for the catalog
    Marketplace {
        /// Output file (default: .claude-plugin/marketplace.json under the root)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let verbose = cli.verbose > 0;

    let result = match cli.command {
        Commands::Search {
            query,
            category,
            tag,
            source,
            limit,
        } => cmd::search::run(
            &root,
            cmd::search::SearchArgs {
                query: query.unwrap_or_default(),
                category,
                tag,
                source,
                limit,
            },
            verbose,
            cli.json,
        ),
        Commands::Show { path } => cmd::show::run(&root, &path, verbose, cli.json),
        Commands::List { category } => {
            cmd::list::run(&root, category.as_deref(), verbose, cli.json)
        }
        Commands::Tags => cmd::tags::run(&root, verbose, cli.json),
        Commands::Validate => cmd::validate::run(&root, verbose, cli.json),
        Commands::Marketplace { output } => {
            cmd::marketplace::run(&root, output.as_deref(), verbose, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
