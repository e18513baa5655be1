use std::sync::Arc;
use std::time::Duration;

use chordkv_core::client::RingClient;
use chordkv_core::dht::Stabilizer;
use chordkv_core::hasher::sha2_hasher;
use chordkv_core::swarm::SwarmBuilder;
use chordkv_node::config::Config;
use chordkv_node::consts::DEFAULT_CONFIG_LOCATION;
use chordkv_node::consts::DEFAULT_HASH_BITS;
use chordkv_node::consts::DEFAULT_HOST;
use chordkv_node::consts::DEFAULT_PORT;
use chordkv_node::consts::DEFAULT_REQUEST_TIMEOUT_MS;
use chordkv_node::logging::init_logging;
use chordkv_node::logging::LogLevel;
use chordkv_node::util::build_version;
use chordkv_node::util::split_addr;
use chordkv_transport::connections::TcpTransport;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use futures::channel::oneshot;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, value_enum, env, help = "If not provided, use log_level in config file or info")]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Initializes a node with the given configuration.")]
    Init(InitCommand),
    #[command(about = "Starts a long-running ring node.")]
    Run(RunCommand),
    #[command(about = "Stores a value on the ring.")]
    Set(SetCommand),
    #[command(about = "Reads a value from the ring.")]
    Get(KeyCommand),
    #[command(about = "Deletes a value from the ring.")]
    Del(KeyCommand),
    #[command(about = "Shows the node owning a key.")]
    Lookup(KeyCommand),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = DEFAULT_CONFIG_LOCATION,
        help = "Config file location"
    )]
    pub config: String,
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = DEFAULT_CONFIG_LOCATION,
        help = "The location of config file"
    )]
    pub location: String,

    #[arg(long, default_value = DEFAULT_HOST, help = "Host the node listens on")]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT, help = "Port the node listens on")]
    pub port: u16,

    #[arg(long, short = 'b', help = "host:port of a ring member to join through")]
    pub bootstrap: Option<String>,
}

#[derive(Args, Debug)]
struct RunCommand {
    #[arg(long, help = "Listen host. If not provided, use host in config file", env)]
    pub host: Option<String>,

    #[arg(long, help = "Listen port. If not provided, use port in config file", env)]
    pub port: Option<u16>,

    #[arg(
        long,
        short = 'b',
        help = "host:port of a ring member to join through. If not provided, use bootstrap in config file",
        env
    )]
    pub bootstrap: Option<String>,

    #[arg(
        long,
        help = "Seconds between stabilization rounds. If not provided, use stabilize_interval in config file",
        env
    )]
    pub stabilize_interval: Option<u64>,

    #[command(flatten)]
    config_args: ConfigArgs,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[arg(
        long,
        short = 'e',
        default_value_t = format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
        help = "host:port of any ring member",
        env
    )]
    endpoint: String,

    #[arg(long, default_value_t = DEFAULT_HASH_BITS, help = "Identifier width of the ring", env)]
    hash_bits: u16,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS, env)]
    request_timeout_ms: u64,
}

impl ClientArgs {
    fn new_client(&self) -> anyhow::Result<RingClient> {
        Ok(RingClient::new(
            self.endpoint.as_str(),
            Arc::new(TcpTransport::new(Duration::from_millis(
                self.request_timeout_ms,
            ))),
            sha2_hasher(self.hash_bits)?,
        ))
    }
}

#[derive(Args, Debug)]
struct SetCommand {
    #[command(flatten)]
    client_args: ClientArgs,

    key: String,

    value: String,
}

#[derive(Args, Debug)]
struct KeyCommand {
    #[command(flatten)]
    client_args: ClientArgs,

    key: String,
}

fn get_value<V>(value: Option<V>, default_value: V) -> V {
    value.unwrap_or(default_value)
}

async fn daemon_run(args: RunCommand, log_level: Option<LogLevel>) -> anyhow::Result<()> {
    let mut c = Config::read_fs(args.config_args.config)?;
    init_logging(get_value(log_level, c.log_level));
    tracing::info!("chordkv {}", build_version());

    c.host = get_value(args.host, c.host);
    c.port = get_value(args.port, c.port);
    c.stabilize_interval = get_value(args.stabilize_interval, c.stabilize_interval);
    c.validate()?;
    let bootstrap = args.bootstrap.or(c.bootstrap.clone());
    let stabilize_interval = c.stabilize_interval;
    tracing::info!("node listens on {}", c.addr());

    let transport = Arc::new(TcpTransport::new(Duration::from_millis(
        c.request_timeout_ms,
    )));
    let swarm = Arc::new(
        SwarmBuilder::new(&c.host, c.port, sha2_hasher(c.hash_bits)?, transport)
            .stale_connection_secs(c.stale_connection_secs)
            .build()?,
    );
    println!("Did: {}", swarm.did());

    let bound = swarm.serve().await?;
    println!("Listening on: {}", bound);

    if let Some(bootstrap) = bootstrap {
        let (bootstrap_host, bootstrap_port) = split_addr(&bootstrap)?;
        swarm.join_ring(&bootstrap_host, bootstrap_port).await?;
    }

    let stabilizer = Arc::new(Stabilizer::new(swarm.clone()));
    let (quit_tx, quit_rx) = oneshot::channel();
    let stabilizing = tokio::spawn(stabilizer.wait(Duration::from_secs(stabilize_interval), quit_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupted, leaving the ring");

    let _ = quit_tx.send(());
    stabilizing.await?;
    swarm.leave().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => daemon_run(args, cli.log_level).await,
        Command::Init(args) => {
            init_logging(get_value(cli.log_level, LogLevel::Info));
            let config = Config::new(&args.host, args.port, args.bootstrap);
            config.validate()?;
            let p = config.write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            println!("The node will listen on: {}", config.addr());
            Ok(())
        }
        Command::Set(args) => {
            init_logging(get_value(cli.log_level, LogLevel::Info));
            args.client_args
                .new_client()?
                .set(args.key.as_bytes(), args.value.as_bytes())
                .await?;
            println!("OK");
            Ok(())
        }
        Command::Get(args) => {
            init_logging(get_value(cli.log_level, LogLevel::Info));
            match args.client_args.new_client()?.get(args.key.as_bytes()).await? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(not found)"),
            }
            Ok(())
        }
        Command::Del(args) => {
            init_logging(get_value(cli.log_level, LogLevel::Info));
            args.client_args
                .new_client()?
                .del(args.key.as_bytes())
                .await?;
            println!("OK");
            Ok(())
        }
        Command::Lookup(args) => {
            init_logging(get_value(cli.log_level, LogLevel::Info));
            let node = args
                .client_args
                .new_client()?
                .lookup(args.key.as_bytes())
                .await?;
            println!("{}", node);
            Ok(())
        }
    }
}
