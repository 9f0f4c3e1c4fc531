use crate::demo::{run_definition, run_demo, DefinitionArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grant_admin::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Grant Advert Admin",
    about = "Run and explore the grant advert admin backend from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the sections, pages and questions an advert is built from
    Definition(DefinitionArgs),
    /// Author, schedule and publish an advert against in-memory adapters
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Definition(args) => run_definition(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
