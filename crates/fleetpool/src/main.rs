mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use fleetpool_cloud::{BackendKind, Connection};
use fleetpool_cloud_aws::FleetRegistry;
use fleetpool_config::PoolConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetpool")]
#[command(
    about = "Inspect and resize AWS Spot Fleets, EC2 Fleets and Auto Scaling groups",
    long_about = None
)]
struct Cli {
    /// Region (overrides the config file and FLEETPOOL_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Endpoint URL override
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Named credentials profile
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List fleets offered for selection
    List {
        /// Currently selected fleet id (always listed and marked)
        #[arg(long)]
        selected: Option<String>,
        /// Include fleets that are not active maintain fleets
        #[arg(long)]
        all: bool,
        /// Only list one kind of fleet
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Print the current state of one fleet as JSON
    State {
        /// Fleet id or Auto Scaling group name
        id: String,
    },
    /// Print the states of several fleets as a JSON object keyed by id
    StateBatch {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Change the target capacity of a fleet
    Resize {
        /// Fleet id or Auto Scaling group name
        id: String,
        /// New target capacity
        #[arg(long)]
        target: u32,
        /// Minimum size (required for Auto Scaling groups, ignored for fleets)
        #[arg(long)]
        min: Option<u32>,
        /// Maximum size (required for Auto Scaling groups, ignored for fleets)
        #[arg(long)]
        max: Option<u32>,
    },
    /// List regions enabled for the account
    Regions,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Spot,
    Ec2,
    Asg,
}

impl From<KindArg> for BackendKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Spot => BackendKind::SpotFleet,
            KindArg::Ec2 => BackendKind::Ec2Fleet,
            KindArg::Asg => BackendKind::AutoScalingGroup,
        }
    }
}

/// Resolved settings shared by every command
pub struct Context {
    pub config: PoolConfig,
    pub conn: Connection,
    pub registry: FleetRegistry,
}

impl Context {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = fleetpool_config::load_config()?.apply_env();
        if let Some(region) = &cli.region {
            config.region = region.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(profile) = &cli.profile {
            config.credentials_ref = Some(profile.clone());
        }

        let conn = config.connection();
        let registry = FleetRegistry::with_sdk(config.retry_config());
        Ok(Self {
            config,
            conn,
            registry,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdoutはJSON出力に使うので、ログはstderrに出力
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ctx = Context::new(&cli)?;
    tracing::debug!(region = %ctx.conn.region, "Resolved connection");

    match cli.command {
        Commands::List {
            selected,
            all,
            kind,
        } => {
            commands::list::handle(&ctx, selected.as_deref(), all, kind.map(Into::into)).await?;
        }
        Commands::State { id } => {
            commands::state::handle(&ctx, &id).await?;
        }
        Commands::StateBatch { ids } => {
            commands::state::handle_batch(&ctx, &ids).await?;
        }
        Commands::Resize {
            id,
            target,
            min,
            max,
        } => {
            commands::resize::handle(&ctx, &id, target, min, max).await?;
        }
        Commands::Regions => {
            commands::regions::handle(&ctx).await?;
        }
    }

    Ok(())
}
