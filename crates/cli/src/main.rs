use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_kernel::settings::Settings;

/// Libris book catalogue service
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            tracing::info!(env = ?settings.environment, "starting libris server");
            libris_app::serve(settings).await
        }
        Command::Migrate => {
            let applied = libris_app::migrate(settings).await?;
            tracing::info!(applied, "migrations applied");
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}
