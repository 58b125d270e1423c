use clap::Parser;
use pcp_orchestrator::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let state = cli::bootstrap(cli.catalog).await?;

    match cli.command {
        Command::Render(args) => cli::render::run(args, &state).await,
        Command::Run(args) => cli::run::run(args, &state).await,
        Command::Context(args) => cli::context::run(args, &state).await,
        Command::Tools(args) => cli::tools::list(args, &state).await,
        Command::Invoke(args) => cli::tools::invoke(args, &state).await,
    }
}
