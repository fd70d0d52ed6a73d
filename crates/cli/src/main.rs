use clap::{Parser, Subcommand};
use opsbot::driver::{Command, Driver, Presenter};
use opsbot::session::{ConnectionState, Session};
use opsbot::timeline::{Sender, TimelineEntry};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "opsbot")]
#[command(about = "IT Ops chat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: OPSBOT_CONFIG_PATH or ~/.opsbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Chat with the assistant service (interactive). Type /exit or /quit to leave.
    Chat {
        /// Config file path (default: OPSBOT_CONFIG_PATH or ~/.opsbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Assistant WebSocket URL (default from OPSBOT_ASSISTANT_URL or config)
        #[arg(long, short, value_name = "URL")]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("opsbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, url }) => {
            if let Err(e) = run_chat(config, url).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(opsbot::config::default_config_path);
    let dir = opsbot::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Prints timeline entries as they are appended, sanitized, one prefix per entry.
struct TerminalPresenter;

const CONTINUATION: &str = "     ";

impl Presenter for TerminalPresenter {
    fn entry_appended(&mut self, entry: &TimelineEntry) {
        let prefix = match entry.sender {
            Sender::User => "you> ",
            Sender::Bot => "bot> ",
        };
        for (i, line) in entry.display_text().split('\n').enumerate() {
            println!("{}{}", if i == 0 { prefix } else { CONTINUATION }, line);
        }
    }

    fn state_changed(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connecting => {}
            ConnectionState::Open => eprintln!("(connected; /exit to leave)"),
            ConnectionState::Closed => eprintln!("(connection closed)"),
        }
    }

    fn options_offered(&mut self, options: &[String]) {
        for (i, option) in options.iter().enumerate() {
            println!("{}{}) {}", CONTINUATION, i + 1, option);
        }
    }
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
) -> anyhow::Result<()> {
    let (config, _) = opsbot::config::load_config(config_path)?;
    let url = url.unwrap_or_else(|| opsbot::config::resolve_assistant_url(&config));
    log::info!("connecting to {}", url);

    let (sink, events) = opsbot::transport::connect(url.clone());
    let session = Session::new(sink, &config.chat);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let input = line.trim_end_matches(&['\r', '\n'][..]);
            let command = if input.trim().eq_ignore_ascii_case("/exit")
                || input.trim().eq_ignore_ascii_case("/quit")
            {
                Command::Close
            } else {
                Command::Input(input.to_string())
            };
            let closing = command == Command::Close;
            if cmd_tx.blocking_send(command).is_err() || closing {
                break;
            }
        }
    });

    let (session, _) = Driver::new(session, TerminalPresenter).run(events, cmd_rx).await;
    if session.timeline().is_empty() {
        anyhow::bail!("could not connect to {}", url);
    }
    Ok(())
}
