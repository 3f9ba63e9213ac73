mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitepack")]
#[command(version, about = "Fill in, link and package static HTML sites", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Scan a site folder and start tracking it
    Init {
        /// Path to the site folder
        path: PathBuf,
    },

    /// List the placeholders of every page and what they are filled with
    Placeholders {
        /// Path to the site folder
        path: PathBuf,
    },

    /// Fill a placeholder with text
    Set {
        /// Path to the site folder
        path: PathBuf,
        /// Page, relative to the site folder
        page: String,
        /// Placeholder name
        name: String,
        /// Text to insert
        value: String,
    },

    /// Fill a placeholder with a link to another file of the site
    Link {
        /// Path to the site folder
        path: PathBuf,
        /// Page, relative to the site folder
        page: String,
        /// Placeholder name
        name: String,
        /// Linked file, relative to the site folder
        target: String,
    },

    /// Clear the value or link of a placeholder
    Unset {
        /// Path to the site folder
        path: PathBuf,
        /// Page, relative to the site folder
        page: String,
        /// Placeholder name
        name: String,
    },

    /// Pick the page exported as the site's index.html
    Home {
        /// Path to the site folder
        path: PathBuf,
        /// Page, relative to the site folder
        page: String,
    },

    /// Set the filename a page is exported under
    Rename {
        /// Path to the site folder
        path: PathBuf,
        /// Page, relative to the site folder
        page: String,
        /// New filename (derived from the page title when omitted)
        new_name: Option<String>,
        /// Ask the AI assistant for a name instead
        #[arg(long, conflicts_with = "new_name")]
        ai: bool,
    },

    /// Check the site for problems that would break the export
    Validate {
        /// Path to the site folder
        path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Review page markup (accessibility, SEO, structure)
    Audit {
        /// Path to the site folder
        path: PathBuf,
        /// Also ask the AI assistant
        #[arg(long)]
        ai: bool,
        /// Only audit this page
        #[arg(long)]
        page: Option<String>,
    },

    /// Suggest descriptive filenames for every page
    Suggest {
        /// Path to the site folder
        path: PathBuf,
        /// Rename pages to the suggested names
        #[arg(long)]
        apply: bool,
        /// Derive names from page titles without the assistant
        #[arg(long)]
        local: bool,
    },

    /// Write the finished site to a folder
    Build {
        /// Path to the site folder
        path: PathBuf,
        /// Output directory for the finished site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the finished site to a ZIP archive
    Package {
        /// Path to the site folder
        path: PathBuf,
        /// Archive to write (default: <folder name>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview the finished site locally with live reload
    Preview {
        /// Path to the site folder
        path: PathBuf,
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// AI assistant settings
    Ai {
        #[command(subcommand)]
        command: AiCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
enum AiCommand {
    /// Store the API key and model used by the assistant
    ///
    /// Create a key at: https://aistudio.google.com/app/apikey
    Configure,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Placeholders { path } => commands::placeholders::list(path).await,
        Command::Set {
            path,
            page,
            name,
            value,
        } => commands::placeholders::set(path, page, name, value).await,
        Command::Link {
            path,
            page,
            name,
            target,
        } => commands::placeholders::link(path, page, name, target).await,
        Command::Unset { path, page, name } => {
            commands::placeholders::unset(path, page, name).await
        }
        Command::Home { path, page } => commands::home::run(path, page).await,
        Command::Rename {
            path,
            page,
            new_name,
            ai,
        } => commands::rename::run(path, page, new_name, ai).await,
        Command::Validate { path, json } => commands::validate::run(path, json).await,
        Command::Audit { path, ai, page } => commands::audit::run(path, ai, page).await,
        Command::Suggest { path, apply, local } => {
            commands::suggest::run(path, apply, local).await
        }
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Package { path, output } => commands::package::run(path, output).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Ai { command } => match command {
            AiCommand::Configure => commands::ai::configure().await,
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitepack", &mut io::stdout());
            Ok(())
        }
    }
}
