use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use community_hub::{
    db::postgres::create_pool,
    graceful_shutdown::shutdown_signal,
    repositories::{
        permission::PermissionRepository,
        sqlx_repo::{SqlxPermissionRepo, SqlxUserRepo},
        user::UserRepository,
    },
    settings::AppConfig,
    telemetry::init_tracing,
    use_cases::{access::AccessControlHandler, usernames::UsernameGenerator},
};

#[derive(Parser)]
#[command(name = "console")]
#[command(version, about = "Maintenance commands for the community hub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create missing permissions and roles and correct role grants
    #[command(name = "permissions:sync")]
    PermissionsSync {
        /// Also delete roles and permissions that are no longer declared
        #[arg(long)]
        prune: bool,
    },

    /// Assign usernames to users that do not have one yet
    #[command(name = "usernames:backfill")]
    UsernamesBackfill,

    /// Give a role to the user with the given email
    #[command(name = "roles:assign")]
    RolesAssign {
        #[arg(long)]
        email: String,

        #[arg(long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(false);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::for_console().context("loading configuration")?;
    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("connecting to the database")?;

    let result = match cli.command {
        Command::PermissionsSync { prune } => {
            let repo: Arc<dyn PermissionRepository> = Arc::new(SqlxPermissionRepo::new(pool.clone()));
            let report = AccessControlHandler::new(repo).sync(prune).await?;
            print_report(&report, cli.json)
        }
        Command::UsernamesBackfill => {
            let repo: Arc<dyn UserRepository> = Arc::new(SqlxUserRepo::new(pool.clone()));
            let generator = UsernameGenerator::new(repo);
            // every claim commits on its own, so stopping midway loses nothing
            let report = tokio::select! {
                report = generator.backfill() => report?,
                received = shutdown_signal() => {
                    pool.close().await;
                    anyhow::bail!("backfill interrupted by {received}; run it again to continue");
                }
            };
            if report.failed > 0 {
                tracing::warn!(failed = report.failed, "Some users are still without a username");
            }
            if cli.json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("usernames assigned: {}, failed: {}", report.assigned, report.failed);
            }
            Ok(())
        }
        Command::RolesAssign { email, role } => {
            let users = SqlxUserRepo::new(pool.clone());
            let user = users
                .get_user_by_email(&email.trim().to_lowercase())
                .await?
                .with_context(|| format!("no user with email {email}"))?;

            let repo: Arc<dyn PermissionRepository> = Arc::new(SqlxPermissionRepo::new(pool.clone()));
            AccessControlHandler::new(repo).assign_role(user.id, &role).await?;
            println!("role '{role}' assigned to {email}");
            Ok(())
        }
    };

    pool.close().await;
    result
}

fn print_report(report: &community_hub::access_control::SyncReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
