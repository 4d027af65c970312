use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warpgrid_nomination::OwnerReference;

mod commands;

#[derive(Parser)]
#[command(
    name = "nomctl",
    about = "WarpGrid nomination — inspect and exercise node placement plans",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Node state database
    #[arg(long, global = true, default_value = "warpgrid.redb")]
    db: PathBuf,
    /// Nomination config (nomination.toml); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage node records
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Read or write a node's placement plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Score a node for an instance without changing anything
    Score {
        #[command(flatten)]
        target: Target,
    },
    /// Run a pre-bind admission, consuming plan quota on the node
    Admit {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Subcommand)]
enum NodeAction {
    /// Register (or replace) a node
    Add {
        #[arg(short, long)]
        node: String,
        /// Node label as key=value; repeatable
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
    /// List registered nodes
    List,
}

#[derive(Subcommand)]
enum PlanAction {
    /// Print the node's plan
    Show {
        #[arg(short, long)]
        node: String,
    },
    /// Replace the node's plan with a JSON object of workload key → quota
    Set {
        #[arg(short, long)]
        node: String,
        #[arg(short, long)]
        plan: String,
    },
}

/// An instance and the node it is being evaluated against.
#[derive(clap::Args)]
struct Target {
    #[arg(long)]
    node: String,
    #[arg(long, default_value = "default")]
    namespace: String,
    /// Instance name, for logs
    #[arg(long, default_value = "nomctl")]
    name: String,
    /// Owning controller as Kind/name; repeatable
    #[arg(long = "owner")]
    owners: Vec<OwnerReference>,
}

fn parse_label(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nomctl=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::open(&cli.db, cli.config.as_deref())?;

    match cli.command {
        Commands::Node { action } => match action {
            NodeAction::Add { node, labels } => commands::node::add(&ctx, &node, labels),
            NodeAction::List => commands::node::list(&ctx),
        },
        Commands::Plan { action } => match action {
            PlanAction::Show { node } => commands::plan::show(&ctx, &node),
            PlanAction::Set { node, plan } => commands::plan::set(&ctx, &node, &plan),
        },
        Commands::Score { target } => {
            commands::schedule::score(&ctx, &target.instance(), &target.node)
        }
        Commands::Admit { target } => {
            commands::schedule::admit(&ctx, &target.instance(), &target.node)
        }
    }
}

impl Target {
    fn instance(&self) -> warpgrid_nomination::WorkloadInstance {
        warpgrid_nomination::WorkloadInstance {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            owner_references: self.owners.clone(),
        }
    }
}
