//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cardmart", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply (or roll back) database migrations, including the role seed
    Migrate {
        /// Roll back every migration instead
        #[arg(long)]
        down: bool,
    },

    /// Inspect and change user role memberships
    Roles {
        #[command(subcommand)]
        roles_cmd: RolesCommands,
    },

    /// Print PostgreSQL provisioning SQL for the tier credentials
    Grants {
        /// Schema holding the application tables
        #[arg(long, default_value = "public")]
        schema: String,

        /// Only emit GRANT/REVOKE statements
        #[arg(long)]
        skip_create_roles: bool,
    },

    /// Credential tier diagnostics
    Tiers {
        #[command(subcommand)]
        tiers_cmd: TiersCommands,
    },

    /// Print a sample configuration file
    SampleConfig,
}

#[derive(Subcommand)]
pub enum RolesCommands {
    /// List a user's roles
    List {
        #[arg(long)]
        user: i32,
    },

    /// Attach a role to a user
    Assign {
        #[arg(long)]
        user: i32,
        #[arg(long)]
        role: String,
    },

    /// Detach a role from a user
    Detach {
        #[arg(long)]
        user: i32,
        #[arg(long)]
        role: String,
    },

    /// Replace a user's roles (comma-separated)
    Sync {
        #[arg(long)]
        user: i32,
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TiersCommands {
    /// Connect every configured tier and report reachability
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_roles_sync_splits_role_list() {
        let cli = Cli::try_parse_from([
            "cardmart",
            "--config",
            "cardmart.yaml",
            "roles",
            "sync",
            "--user",
            "7",
            "--roles",
            "Employee,Customer",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("cardmart.yaml")));
        match cli.command {
            Commands::Roles {
                roles_cmd: RolesCommands::Sync { user, roles },
            } => {
                assert_eq!(user, 7);
                assert_eq!(roles, vec!["Employee", "Customer"]);
            }
            _ => panic!("expected roles sync"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["cardmart", "migrate", "--down", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Migrate { down: true }));
    }

    #[test]
    fn test_grants_defaults_and_missing_user() {
        let cli = Cli::try_parse_from(["cardmart", "grants"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Grants { ref schema, skip_create_roles: false } if schema == "public"
        ));

        assert!(Cli::try_parse_from(["cardmart", "roles", "assign", "--role", "Admin"]).is_err());
    }
}
