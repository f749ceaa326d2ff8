use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use portico_cli::OutputFormat;
use portico_cli::commands::{self, PortalArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portico")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Log into a web portal with a headless browser and pull request records",
    long_about = "Portico drives a browser through a portal's login form, then walks its \
                  menus and grid widget to extract the service requests assigned to a handler."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Config file (defaults to <config dir>/portico/config.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log into the portal and report whether it worked
    Login {
        #[command(flatten)]
        portal: PortalArgs,
    },

    /// Fetch the requests assigned to a handler
    Fetch {
        #[command(flatten)]
        portal: PortalArgs,

        /// Handler name to search for
        #[arg(long)]
        name: String,

        /// Organisation partition, e.g. "Ops - East"
        #[arg(long, default_value = "")]
        partition: String,

        /// Write the records to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encode a secret for --secret or a credentials file
    EncodeSecret {
        /// Secret to encode (prompted for when omitted)
        secret: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  bash, zsh, fish, powershell, elvish\n\n\
                            INSTALLATION:\n  \
                            bash: portico completion --shell bash >> ~/.bashrc\n  \
                            zsh:  portico completion --shell zsh > ~/.zfunc/_portico\n  \
                            fish: portico completion --shell fish > ~/.config/fish/completions/portico.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Login { portal } => {
            let settings = commands::config::load(cli.config.as_deref())?;
            commands::login::execute(&portal, settings, cli.format)
        }
        Commands::Fetch {
            portal,
            name,
            partition,
            output,
        } => {
            let settings = commands::config::load(cli.config.as_deref())?;
            commands::fetch::execute(&portal, settings, &name, &partition, output, cli.format)
        }
        Commands::EncodeSecret { secret } => commands::encode_secret::execute(secret),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd, &mut std::io::stdout())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("portico=debug,portico_cli=debug,portico_core=debug,portico_browser=debug")
    } else {
        EnvFilter::new("portico=info,portico_cli=info,portico_core=warn,portico_browser=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
