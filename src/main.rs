use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use elm_lens::{
    cli::{self, Cli, Command},
    logging::init_logger,
    server::Backend,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level.as_deref(), cli.no_color)?;

    match cli.command() {
        Command::Serve => serve(),
        Command::ShowType { file, offset } => {
            println!("{}", cli::show_type(&cli, file, *offset)?);
            Ok(())
        }
        Command::Prelude => {
            println!("{}", cli::prelude(&cli)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn serve() -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting elm-lens language server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}
