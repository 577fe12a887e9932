use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use netdog::harness::self_test;
use netdog::logging::init_tracing;
use netdog::{AppConfig, Identity, LatencyReport, LogFormat, QuicEchoClient, QuicEchoServer, Verification};
use std::path::PathBuf;
use tracing::info;

/// Network diagnostics: QUIC echo server and latency client
#[derive(Parser, Debug)]
#[command(name = "netdog", version, about)]
struct Cli {
    /// TOML config file
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Verbose structured logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Developer name
    #[arg(long, global = true)]
    developer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve as an echo host
    #[command(visible_alias = "s")]
    Serve(AddrArgs),
    /// Measure round trips against an echo host
    #[command(visible_alias = "c")]
    Client(ClientArgs),
    /// Run a server and a client in this process
    #[command(visible_alias = "t")]
    Test(ClientArgs),
}

#[derive(Args, Debug)]
struct AddrArgs {
    /// Address to attach to [default: localhost:4242]
    #[arg(short, long)]
    addr: Option<String>,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[command(flatten)]
    target: AddrArgs,

    /// Message to send [default: foobar]
    #[arg(short, long)]
    msg: Option<String>,

    /// Number of timed round trips [default: 1]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,
}

impl Cli {
    /// File values first, then flags on top
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref()).wrap_err("Failed to load configuration")?;

        if self.verbose {
            config.log_format = LogFormat::Verbose;
        }
        if let Some(developer) = &self.developer {
            config.developer = developer.clone();
        }

        let (target, client) = match &self.command {
            Command::Serve(target) => (target, None),
            Command::Client(args) | Command::Test(args) => (&args.target, Some(args)),
        };
        if let Some(addr) = &target.addr {
            config.addr = addr.clone();
        }
        if let Some(args) = client {
            if let Some(msg) = &args.msg {
                config.message = msg.clone();
            }
            if let Some(count) = args.count {
                config.count = usize::try_from(count).wrap_err("count out of range")?;
            }
        }

        config.validate().wrap_err("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.app_config()?;

    init_tracing(config.log_format);
    info!(developer = %config.developer, "netdog starting");

    match cli.command {
        Command::Serve(_) => serve(&config).await,
        Command::Client(_) => client(&config).await,
        Command::Test(_) => test(&config).await,
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    let identity = Identity::generate().wrap_err("Failed to generate server identity")?;
    let server = QuicEchoServer::bind(config.server_config(), &identity)
        .await
        .wrap_err("Failed to bind echo server")?;

    info!(addr = %config.addr, "Serving");
    server.serve().await.wrap_err("Echo server stopped")
}

async fn client(config: &AppConfig) -> Result<()> {
    let started = std::time::Instant::now();
    let mut client = QuicEchoClient::dial_with_config(
        config.addr.as_str(),
        Verification::SkipVerification,
        config.client_config(),
    )
    .await
    .wrap_err_with(|| format!("Failed to connect to {}", config.addr))?;

    let report = client
        .run(config.message.clone().into_bytes(), config.count)
        .await
        .wrap_err("Echo run failed")?;
    client.close().await;

    report_completion(config, &report, started.elapsed().as_secs_f64());
    Ok(())
}

async fn test(config: &AppConfig) -> Result<()> {
    let started = std::time::Instant::now();
    let identity = Identity::generate().wrap_err("Failed to generate server identity")?;
    let report = self_test(
        identity,
        config.server_config(),
        config.client_config(),
        &config.message,
        config.count,
    )
    .await
    .wrap_err("Self-test failed")?;

    report_completion(config, &report, started.elapsed().as_secs_f64());
    Ok(())
}

fn report_completion(config: &AppConfig, report: &LatencyReport, elapsed_secs: f64) {
    println!("{report}");
    info!(
        addr = %config.addr,
        count = report.count(),
        elapsed_us = report.mean_micros().unwrap_or_default(),
        elapsed_secs,
        "Echo run complete"
    );
}
