use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use roundseq::app::App;
use roundseq::config;
use roundseq::midi::{self, Backend};
use roundseq::sys::{SOCKET_PATH, runtime};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roundseq", version, about = "Radial touch MIDI note trigger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file to use instead of the one in the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log notes instead of sending them to a MIDI port
    #[arg(long)]
    mock: bool,

    /// Output port to connect to (case-insensitive substring of its name)
    #[arg(short, long)]
    port: Option<String>,

    /// Write the default config file if none exists, then exit
    #[arg(long)]
    write_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Send one command line to the running service, e.g. `send down 1 940 540`
    Send {
        #[arg(required = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// List available MIDI output ports
    Ports,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Send { words }) => send_command(&words.join(" ")),
        Some(Commands::Ports) => list_ports(),
        None => {
            let config_path = match cli.config {
                Some(path) => path,
                None => config::get_config_path()?,
            };
            if cli.write_config {
                config::write_default_config_to(&config_path)?;
                println!("{}", config_path.display());
                return Ok(());
            }
            run(config_path, cli.mock, cli.port)
        }
    }
}

fn run(config_path: PathBuf, mock: bool, port: Option<String>) -> anyhow::Result<()> {
    let config = config::load_config_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let layout = config.validate()?;
    log::info!(
        "{} slices, ring {}..{} around ({}, {})",
        layout.slice_count(),
        config.layout.inner_radius,
        config.layout.outer_radius,
        config.layout.center.x,
        config.layout.center.y
    );

    let backend = if mock { Backend::Mock } else { config.midi.backend };
    let port = port.or_else(|| config.midi.port.clone());
    let service = midi::open(backend, port.as_deref());

    let (tx, rx) = async_channel::bounded(64);

    // Start Background Services
    runtime::start_background_services(tx.clone(), config_path.clone());

    App::new(&config, layout, service, config_path).run(rx);
    Ok(())
}

fn list_ports() -> anyhow::Result<()> {
    let ports = midi::create(Backend::Midir).list_ports()?;
    if ports.is_empty() {
        println!("No MIDI output ports found");
    }
    for (i, name) in ports.iter().enumerate() {
        println!("{i}: {name}");
    }
    Ok(())
}

fn send_command(cmd: &str) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to roundseq at {}: {}. Is it running?",
            SOCKET_PATH,
            e
        )
    })?;
    writeln!(stream, "{}", cmd)?;
    Ok(())
}
