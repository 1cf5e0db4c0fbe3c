//! PostgreSQL provisioning SQL for the tier credentials
//!
//! Each operation tier is a login role holding exactly the privileges of its
//! [`PrivilegeSet`](crate::tier::PrivilegeSet). DATA_ENTRY may only UPDATE
//! the columns listed in [`DATA_ENTRY_UPDATE_COLUMNS`].

use std::fmt::Write;

use crate::tier::{ConnectionTier, Privilege};

/// Application tables covered by the tier grants
pub const DEFAULT_TABLES: &[&str] = &["users", "roles", "role_user", "products", "orders"];

/// Columns DATA_ENTRY may UPDATE, per table. Tables absent here get no
/// UPDATE at that tier.
pub const DATA_ENTRY_UPDATE_COLUMNS: &[(&str, &[&str])] = &[
    (
        "products",
        &["name", "description", "price_cents", "stock_quantity", "updated_at"],
    ),
    ("orders", &["status", "updated_at"]),
];

/// Options for rendering provisioning SQL
#[derive(Debug, Clone)]
pub struct GrantOptions {
    pub schema: String,
    pub tables: Vec<String>,
    /// Emit `CREATE ROLE ... LOGIN` statements. Passwords are left as
    /// placeholders for the operator to fill.
    pub create_roles: bool,
}

impl Default for GrantOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            create_roles: true,
        }
    }
}

/// Render the full script for every operation tier
pub fn render_all(options: &GrantOptions) -> String {
    let mut script = String::new();
    for tier in ConnectionTier::OPERATION_TIERS {
        script.push_str(&render_tier(tier, options));
        script.push('\n');
    }
    script
}

/// Render the statements for one tier. The default connection has no
/// managed grants and renders as an empty string.
pub fn render_tier(tier: ConnectionTier, options: &GrantOptions) -> String {
    let Some(privileges) = tier.privileges() else {
        return String::new();
    };

    let role = tier.database_role();
    let schema = quote_ident(&options.schema);
    let mut sql = String::new();

    let _ = writeln!(sql, "-- {} tier", tier.as_str().to_uppercase());
    if options.create_roles {
        let _ = writeln!(
            sql,
            "CREATE ROLE {} LOGIN PASSWORD '<{}_password>';",
            quote_ident(role),
            role
        );
    }
    let _ = writeln!(sql, "REVOKE ALL ON ALL TABLES IN SCHEMA {} FROM {};", schema, quote_ident(role));
    let _ = writeln!(sql, "GRANT USAGE ON SCHEMA {} TO {};", schema, quote_ident(role));

    if privileges.allows(Privilege::Ddl) {
        let _ = writeln!(sql, "GRANT ALL PRIVILEGES ON SCHEMA {} TO {};", schema, quote_ident(role));
        let _ = writeln!(
            sql,
            "GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA {} TO {};",
            schema,
            quote_ident(role)
        );
        let _ = writeln!(
            sql,
            "GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA {} TO {};",
            schema,
            quote_ident(role)
        );
        return sql;
    }

    for table in &options.tables {
        let qualified = format!("{}.{}", schema, quote_ident(table));
        let mut table_privileges: Vec<&str> = Vec::new();

        for privilege in privileges.privileges() {
            match privilege {
                Privilege::Update if privileges.has_restricted_update() => {}
                other => table_privileges.push(other.as_sql()),
            }
        }

        if !table_privileges.is_empty() {
            let _ = writeln!(
                sql,
                "GRANT {} ON {} TO {};",
                table_privileges.join(", "),
                qualified,
                quote_ident(role)
            );
        }

        if privileges.allows(Privilege::Update) && privileges.has_restricted_update() {
            if let Some(columns) = restricted_update_columns(table) {
                let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
                let _ = writeln!(
                    sql,
                    "GRANT UPDATE ({}) ON {} TO {};",
                    columns.join(", "),
                    qualified,
                    quote_ident(role)
                );
            }
        }
    }

    if privileges.allows(Privilege::Insert) {
        let _ = writeln!(
            sql,
            "GRANT USAGE ON ALL SEQUENCES IN SCHEMA {} TO {};",
            schema,
            quote_ident(role)
        );
    }

    sql
}

/// Column allow-list for DATA_ENTRY updates on `table`
pub fn restricted_update_columns(table: &str) -> Option<&'static [&'static str]> {
    DATA_ENTRY_UPDATE_COLUMNS
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, columns)| *columns)
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
