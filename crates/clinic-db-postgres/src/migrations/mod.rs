//! Database migrations, embedded at compile time.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use sqlx_postgres::PgPool;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// Embedded migrations as `(version, description, sql)`, in order.
///
/// To add a migration, create the SQL file under `migrations/` and append an
/// entry here.
macro_rules! embedded_migrations {
    () => {
        &[(
            20240101000001i64,
            "initial_schema",
            include_str!("../../migrations/20240101000001_initial_schema.sql"),
        )]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| {
            Migration::new(
                *version,
                Cow::Borrowed(*description),
                MigrationType::Simple,
                Cow::Borrowed(*sql),
                false,
            )
        })
        .collect()
}

/// Applies every pending migration. Applied versions are tracked in
/// `_sqlx_migrations`.
///
/// # Errors
///
/// Returns `PostgresError::Migration` if a migration fails to apply.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running database migrations");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(e.to_string()))?;

    info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered_and_non_empty() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());
        assert!(migrations.windows(2).all(|w| w[0].version < w[1].version));
        for migration in &migrations {
            assert!(migration.sql.contains("CREATE TABLE"));
        }
    }

    #[test]
    fn schema_declares_unique_constraints() {
        let sql = &build_migrations()[0].sql;
        for constraint in [
            "users_username_key",
            "patients_user_id_key",
            "patients_email_key",
            "healthcare_providers_user_id_key",
            "healthcare_providers_email_key",
        ] {
            assert!(sql.contains(constraint), "missing {constraint}");
        }
    }
}
