mod cmd;
mod output;
mod root;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, context::ContextSubcommand, feedback::FeedbackSubcommand,
    group::GroupSubcommand, modules::ModulesSubcommand,
};
use std::path::PathBuf;
use superstack_core::{config::Config, paths, store::FileStore};

#[derive(Parser)]
#[command(
    name = "dev",
    about = "Manage context modules and push them to AI assistants",
    version,
    propagate_version = true
)]
struct Cli {
    /// Context modules directory (default: config, then auto-detect context-modules/)
    #[arg(long, global = true, env = "SUPERSTACK_MODULES")]
    modules: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the module catalog
    Modules {
        #[command(subcommand)]
        subcommand: ModulesSubcommand,
    },

    /// Inspect and edit the active context
    Context {
        #[command(subcommand)]
        subcommand: ContextSubcommand,
    },

    /// Manage named context groups
    Group {
        #[command(subcommand)]
        subcommand: GroupSubcommand,
    },

    /// Format the active context and copy it to the clipboard
    Push(cmd::push::PushArgs),

    /// Estimate tokens for files or the active context
    Tokens(cmd::tokens::TokensArgs),

    /// Suggest modules and groups for a piece of text
    Recommend(cmd::recommend::RecommendArgs),

    /// List available formatters and their options
    Formatters,

    /// Split a long markdown document into module files by heading
    Split(cmd::split::SplitArgs),

    /// Record and review feedback on how modules perform
    Feedback {
        #[command(subcommand)]
        subcommand: FeedbackSubcommand,
    },

    /// Show, validate or edit the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let state_dir = paths::state_dir().context("failed to locate state directory")?;
    let config = Config::load(&state_dir).context("failed to load config")?;
    let store = FileStore::new(&state_dir);
    let modules_root = root::resolve_modules_root(cli.modules.as_deref(), &config);
    let env = cmd::Env {
        modules_root: &modules_root,
        store: &store,
        config: &config,
    };

    match cli.command {
        Commands::Modules { subcommand } => cmd::modules::run(&env, subcommand, cli.json),
        Commands::Context { subcommand } => cmd::context::run(&env, subcommand, cli.json),
        Commands::Group { subcommand } => cmd::group::run(&env, subcommand, cli.json),
        Commands::Push(args) => cmd::push::run(&env, args, cli.json),
        Commands::Tokens(args) => cmd::tokens::run(&env, args, cli.json),
        Commands::Recommend(args) => cmd::recommend::run(&env, args, cli.json),
        Commands::Formatters => cmd::formatters::run(cli.json),
        Commands::Split(args) => cmd::split::run(args, cli.json),
        Commands::Feedback { subcommand } => cmd::feedback::run(&env, subcommand, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(&env, &state_dir, subcommand, cli.json)
        }
    }
}
