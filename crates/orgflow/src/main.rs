mod commands;
mod console;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orgflow")]
#[command(about = "Provision and tear down a multi-account cloud organization", long_about = None)]
struct Cli {
    /// Path to the accounts file (defaults to ./configs/accounts.yaml)
    #[arg(short, long, global = true, env = "ORGFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every OU, account and stack in the accounts file, in order
    Launch {
        /// Environment label shown in the run header (dev, prod)
        #[arg(short, long)]
        env: Option<String>,
        /// Region for stack deployments (overrides the accounts file)
        #[arg(short, long)]
        region: Option<String>,
        /// Print the stages that would run and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Tear down everything in the accounts file, in reverse order
    Cleanup {
        /// Region the stacks were deployed to (overrides the accounts file)
        #[arg(short, long)]
        region: Option<String>,
        /// Confirm the teardown; without it the teardown order is printed only
        #[arg(short, long)]
        yes: bool,
    },
    /// Create an organizational unit
    CreateOu {
        /// Name of the organizational unit
        #[arg(long)]
        name: String,
        /// Parent OU or root ID
        #[arg(long)]
        parent_id: String,
    },
    /// Create a member account and optionally move it into an OU
    CreateAccount {
        /// Account name
        #[arg(long)]
        name: String,
        /// Root email for the account
        #[arg(long)]
        email: String,
        /// OU ID to place the account in
        #[arg(long)]
        ou: Option<String>,
    },
    /// Deploy a stack template into a member account
    DeployStack {
        /// Target account ID
        #[arg(long)]
        account_id: String,
        /// Template file name under the templates directory
        #[arg(long)]
        template: String,
        /// AWS region
        #[arg(short, long, default_value = orgflow_cloud::DEFAULT_REGION)]
        region: String,
        /// Directory holding the templates
        #[arg(long, default_value = "templates")]
        templates_dir: PathBuf,
        /// Prefix for the stack name
        #[arg(long, default_value = orgflow_cloud::DEFAULT_STACK_PREFIX)]
        stack_prefix: String,
    },
    /// Attach a service control policy to an OU or account
    AttachScp {
        /// Service control policy ID
        #[arg(long)]
        policy_id: String,
        /// Target OU or account ID
        #[arg(long)]
        target_id: String,
    },
    /// List all accounts in the organization
    ListAccounts,
    /// Delete a stack from a member account
    DeleteStack {
        /// Account that owns the stack
        #[arg(long)]
        account_id: String,
        /// Stack name
        #[arg(long)]
        stack_name: String,
        /// AWS region
        #[arg(short, long, default_value = orgflow_cloud::DEFAULT_REGION)]
        region: String,
    },
    /// Move an account back to the root and request its closure
    DeleteAccount {
        /// Account ID
        #[arg(long)]
        account_id: String,
    },
    /// Delete an empty organizational unit
    DeleteOu {
        /// OU ID
        #[arg(long)]
        ou_id: String,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "orgflow=debug,info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Version => {
            println!("orgflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Launch {
            env,
            region,
            dry_run,
        } => commands::run::launch(config, env.as_deref(), region, dry_run).await,
        Commands::Cleanup { region, yes } => commands::run::cleanup(config, region, yes).await,
        Commands::CreateOu { name, parent_id } => {
            commands::organization::create_ou(&name, &parent_id).await
        }
        Commands::CreateAccount { name, email, ou } => {
            commands::organization::create_account(&name, &email, ou.as_deref()).await
        }
        Commands::AttachScp {
            policy_id,
            target_id,
        } => commands::organization::attach_scp(&policy_id, &target_id).await,
        Commands::ListAccounts => commands::organization::list_accounts().await,
        Commands::DeleteAccount { account_id } => {
            commands::organization::delete_account(&account_id).await
        }
        Commands::DeleteOu { ou_id } => commands::organization::delete_ou(&ou_id).await,
        Commands::DeployStack {
            account_id,
            template,
            region,
            templates_dir,
            stack_prefix,
        } => {
            commands::stack::deploy(
                &account_id,
                &template,
                &region,
                &templates_dir,
                &stack_prefix,
            )
            .await
        }
        Commands::DeleteStack {
            account_id,
            stack_name,
            region,
        } => commands::stack::delete(&account_id, &stack_name, &region).await,
    }
}
