use clap::{Parser, Subcommand};

/// Hostkit - run an application's startup actions and service configuration
#[derive(Parser)]
#[command(name = "hostkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Non-interactive run: suppress startup progress lines
    #[arg(long, global = true)]
    pub cli: bool,

    /// Application name
    #[arg(long, global = true, env = "HOSTKIT_APP_NAME", default_value = "hostkit")]
    pub app_name: String,

    /// Directory to store the boot record. Defaults to ~/.hostkit
    #[arg(long, global = true)]
    pub cache_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the application, configure services and run
    Run {
        /// Keep running until interrupted (Ctrl-C)
        #[arg(long)]
        wait: bool,
    },
    /// List startup actions in execution order
    Actions,
    /// Print the effective application config as JSON
    Info,
}
