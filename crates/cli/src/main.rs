use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wa-relay")]
#[command(about = "WhatsApp to Gemini webhook relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway (GET/POST /webhook, POST /send-document). Credentials come from the config file or the environment (PHONE_NUMBER_ID, ACCESS_TOKEN, VERIFY_TOKEN, GEMINI_API_KEY).
    Gateway {
        /// Config file path (default: WA_RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config, PORT, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send a document link to a WhatsApp number once, without running the gateway.
    SendDocument {
        /// Config file path (default: WA_RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Recipient phone number (international format, no +)
        #[arg(long)]
        to: String,

        /// Public URL of the document
        #[arg(long)]
        url: String,

        /// Caption shown with the document
        #[arg(long, default_value = "Here is the document you requested.")]
        caption: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env: {}", e);
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("wa-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::SendDocument {
            config,
            to,
            url,
            caption,
        }) => {
            if let Err(e) = run_send_document(config, &to, &url, &caption).await {
                log::error!("send-document failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!("starting gateway on {}:{}", config.server.bind, config.server.port);
    lib::gateway::run_gateway(config).await
}

async fn run_send_document(
    config_path: Option<std::path::PathBuf>,
    to: &str,
    url: &str,
    caption: &str,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _) = lib::config::load_config(config_path)?;
    let phone_number_id = config
        .whatsapp
        .phone_number_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .context("PHONE_NUMBER_ID is not configured")?;
    let access_token = config
        .whatsapp
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .context("ACCESS_TOKEN is not configured")?;
    let channel =
        lib::channels::WhatsAppChannel::new(&config.whatsapp.api_url, phone_number_id, access_token);
    channel.send_document(to, url, caption).await?;
    println!("document sent to {}", to);
    Ok(())
}
