use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lcfind::autoscaling::AutoScalingInventory;
use lcfind::aws_cli::AwsCliInventory;
use lcfind::aws_config::configure_aws;
use lcfind::inventory::FileInventory;
use lcfind::output::ModuleResult;
use lcfind::{
    find_launch_configurations, InventoryClient, LaunchConfigurationRecord, LcFindResult,
    QueryParameters, SortOrder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Auto Scaling API via the AWS SDK
    Sdk,
    /// `aws autoscaling describe-launch-configurations`
    Cli,
}

#[derive(Parser)]
#[command(name = "lcfind")]
#[command(version)]
#[command(about = "Find auto scaling launch configurations, optionally filtered, sorted and sliced")]
#[command(long_about = None)]
struct Cli {
    /// AWS region to query
    #[arg(short, long, visible_aliases = ["aws-region", "ec2-region"])]
    region: Option<String>,

    /// Keep only names matching this pattern at their start
    #[arg(long, value_name = "REGEX")]
    name_regex: Option<String>,

    /// Sort by name; required for --sort-order, --sort-start and --sort-end to apply
    #[arg(long)]
    sort: bool,

    #[arg(long, value_enum)]
    sort_order: Option<SortOrder>,

    /// First index of the sorted slice (negative counts from the end)
    #[arg(long, allow_hyphen_values = true)]
    sort_start: Option<String>,

    /// End index (exclusive) of the sorted slice (negative counts from the end)
    #[arg(long, allow_hyphen_values = true)]
    sort_end: Option<String>,

    /// Named AWS profile
    #[arg(long)]
    profile: Option<String>,

    /// JSON module arguments; command line flags take precedence
    #[arg(long, value_name = "PATH")]
    args_file: Option<PathBuf>,

    /// Where to read launch configurations from
    #[arg(long, value_enum, default_value_t = Source::Sdk)]
    source: Source,

    /// Replay a saved describe-launch-configurations JSON document instead of calling AWS
    #[arg(long, value_name = "PATH")]
    from_file: Option<PathBuf>,

    /// Log level (logs go to stderr)
    #[arg(short = 'v', long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn query_parameters(&self) -> QueryParameters {
        QueryParameters {
            region: self.region.clone(),
            name_regex: self.name_regex.clone(),
            sort: self.sort.then_some(true),
            sort_order: self.sort_order,
            sort_start: self.sort_start.clone(),
            sort_end: self.sort_end.clone(),
            profile: self.profile.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lcfind={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = ModuleResult::from(run(&cli).await);
    if let ModuleResult::Failure { msg, .. } = &result {
        error!("{}", msg);
    }

    match serde_json::to_string(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: could not serialise result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if result.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(cli: &Cli) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
    let base = match &cli.args_file {
        Some(path) => QueryParameters::from_args_file(path)?,
        None => QueryParameters::default(),
    };
    let query = base.merge(cli.query_parameters()).validate()?;

    let inventory: Box<dyn InventoryClient> = match (&cli.from_file, cli.source) {
        (Some(path), _) => {
            info!("Replaying launch configurations from {}", path.display());
            Box::new(FileInventory::new(path.clone()))
        }
        (None, Source::Cli) => Box::new(AwsCliInventory::new(query.profile.clone())),
        (None, Source::Sdk) => {
            let config = configure_aws(Some(query.region.clone()), query.profile.clone()).await;
            Box::new(AutoScalingInventory::new(config))
        }
    };

    find_launch_configurations(&query, inventory.as_ref()).await
}
