use clap::{Parser, Subcommand};
use piemenu::config;
use piemenu::gui::app::AppModel;
use piemenu::sys::runtime;
use piemenu::sys::server::{Request, SOCKET_PATH};
use relm4::prelude::*;
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "piemenu", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Run the menu daemon (the default)
    Daemon,
    /// Open the default pie at the pointer
    Show,
    /// Close the open pie
    Hide,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Show => send_request(Request::Show),
        Commands::Hide => send_request(Request::Hide),
        Commands::Daemon => run_daemon(),
    }
}

fn run_daemon() -> anyhow::Result<()> {
    let config = config::load_or_setup();

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx)?;

    let app = RelmApp::new("org.piemenu.piemenu");

    app.run::<AppModel>((config, rx));
    Ok(())
}

fn send_request(request: Request) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to piemenu daemon at {}: {}. Is piemenu running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", request)?;
    Ok(())
}
