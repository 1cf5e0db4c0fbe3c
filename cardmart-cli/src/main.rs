use anyhow::{Context, Result};
use cardmart_config::{CardmartConfig, ConfigLoader, LogLevel};
use cardmart_logging::init_logging;
use cardmart_rbac::{RoleStore, SeaOrmRoleStore};
use cardmart_storage::grants::{self, GrantOptions};
use cardmart_storage::{apply_migrations, rollback_migrations, ConnectionRegistry};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

mod cli;
use cli::{Cli, Commands, RolesCommands, TiersCommands};

fn load_config(config_path: Option<&PathBuf>) -> Result<CardmartConfig> {
    let loader = ConfigLoader::new();
    loader.load(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from environment".to_string(),
    })
}

async fn handle_roles(config: &CardmartConfig, cmd: &RolesCommands) -> Result<()> {
    let registry = ConnectionRegistry::connect(&config.database).await?;
    let store = SeaOrmRoleStore::new(registry.default_connection().clone());

    match cmd {
        RolesCommands::List { user } => {
            let roles = store.roles_of(*user).await?;
            println!("{}", serde_json::to_string_pretty(&roles.names())?);
        }
        RolesCommands::Assign { user, role } => {
            store.assign_role(*user, role).await?;
            println!("Assigned {} to user {}", role, user);
        }
        RolesCommands::Detach { user, role } => {
            store.detach_role(*user, role).await?;
            println!("Detached {} from user {}", role, user);
        }
        RolesCommands::Sync { user, roles } => {
            let names: Vec<&str> = roles.iter().map(String::as_str).collect();
            store.sync_roles(*user, &names).await?;
            println!("User {} now holds: {}", user, names.join(", "));
        }
    }
    Ok(())
}

async fn handle_tiers_check(config: &CardmartConfig) -> Result<()> {
    let registry = ConnectionRegistry::connect(&config.database).await?;
    let report = registry.health_check().await;

    let mut all_reachable = true;
    for health in &report {
        let status = match (health.configured, health.reachable) {
            (false, _) => "not configured (falls back to default)".to_string(),
            (true, true) => "ok".to_string(),
            (true, false) => {
                all_reachable = false;
                format!("unreachable: {}", health.error.as_deref().unwrap_or("unknown error"))
            }
        };
        println!("{:<14} {}", health.tier.as_str(), status);
    }

    if !all_reachable {
        anyhow::bail!("One or more configured tiers are unreachable");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("Invalid --log-level: {}", e))?;
    }
    init_logging(&config.logging)?;
    debug!(config = ?cli.config, "Configuration loaded");

    match &cli.command {
        Commands::Migrate { down } => {
            let registry = ConnectionRegistry::connect(&config.database).await?;
            let db = registry.default_connection();
            if *down {
                rollback_migrations(db).await?;
            } else {
                apply_migrations(db).await?;
            }
        }
        Commands::Roles { roles_cmd } => handle_roles(&config, roles_cmd).await?,
        Commands::Grants {
            schema,
            skip_create_roles,
        } => {
            let options = GrantOptions {
                schema: schema.clone(),
                create_roles: !skip_create_roles,
                ..Default::default()
            };
            print!("{}", grants::render_all(&options));
        }
        Commands::Tiers { tiers_cmd } => match tiers_cmd {
            TiersCommands::Check => handle_tiers_check(&config).await?,
        },
        Commands::SampleConfig => print!("{}", CardmartConfig::generate_sample()),
    }

    Ok(())
}
