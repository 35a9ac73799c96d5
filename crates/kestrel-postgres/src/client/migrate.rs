//! Embedded schema migrations.

use std::future::Future;
use std::time::Instant;

use diesel::migration::MigrationSource;
use diesel::pg::Pg;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Applied and pending migration versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Versions recorded in `__diesel_schema_migrations`, oldest first.
    pub applied_versions: Vec<String>,
    /// Embedded versions not yet applied, oldest first.
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    /// Compares embedded versions against the applied ones.
    pub fn new(embedded: Vec<String>, applied: Vec<String>) -> Self {
        let pending_versions = embedded
            .into_iter()
            .filter(|version| !applied.contains(version))
            .collect();

        Self {
            applied_versions: applied,
            pending_versions,
        }
    }

    /// Returns `true` if no embedded migration is pending.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Migration operations on [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending embedded migration, returning the applied versions.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<Vec<String>>> + Send;

    /// Reports applied and pending migrations.
    fn migration_status(&self) -> impl Future<Output = PgResult<MigrationStatus>> + Send;
}

impl PgClientMigrationExt for PgClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    async fn run_pending_migrations(&self) -> PgResult<Vec<String>> {
        let start = Instant::now();
        let mut conn = self.get_pooled_connection().await?;

        let status = migration_status(&mut conn).await?;
        if status.is_up_to_date() {
            tracing::info!(
                target: TRACING_TARGET_MIGRATION,
                applied = status.applied_versions.len(),
                "Database schema is up to date"
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            pending = status.pending_versions.len(),
            "Applying pending migrations"
        );

        let mut conn: AsyncConnectionWrapper<_> = conn.into();
        let versions = spawn_blocking(move || {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.iter().map(ToString::to_string).collect::<Vec<_>>())
        })
        .await
        .map_err(|error| PgError::Migration(error.into()))?
        .map_err(|error| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %error,
                "Database migration failed"
            );
            PgError::Migration(error)
        })?;

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?start.elapsed(),
            count = versions.len(),
            "Database migrations applied"
        );

        Ok(versions)
    }

    async fn migration_status(&self) -> PgResult<MigrationStatus> {
        let mut conn = self.get_pooled_connection().await?;
        migration_status(&mut conn).await
    }
}

async fn migration_status(conn: &mut AsyncPgConnection) -> PgResult<MigrationStatus> {
    let embedded = MigrationSource::<Pg>::migrations(&MIGRATIONS)
        .map_err(PgError::Migration)?
        .iter()
        .map(|migration| migration.name().version().to_string())
        .collect();

    let applied = applied_migrations(conn).await?;
    Ok(MigrationStatus::new(embedded, applied))
}

async fn applied_migrations(conn: &mut AsyncPgConnection) -> PgResult<Vec<String>> {
    #[derive(diesel::QueryableByName)]
    struct Exists {
        #[diesel(sql_type = diesel::sql_types::Bool)]
        present: bool,
    }

    #[derive(diesel::QueryableByName)]
    struct Version {
        #[diesel(sql_type = diesel::sql_types::Text)]
        version: String,
    }

    let table = diesel::sql_query(
        "SELECT to_regclass('__diesel_schema_migrations') IS NOT NULL AS present",
    )
    .get_result::<Exists>(conn)
    .await?;

    if !table.present {
        return Ok(Vec::new());
    }

    let versions = diesel::sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version")
        .get_results::<Version>(conn)
        .await?
        .into_iter()
        .map(|row| row.version)
        .collect();

    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_excludes_applied() {
        let status = MigrationStatus::new(
            vec!["20260105000000".into(), "20260201000000".into()],
            vec!["20260105000000".into()],
        );
        assert_eq!(status.pending_versions, vec!["20260201000000".to_owned()]);
        assert!(!status.is_up_to_date());
    }

    #[test]
    fn embedded_migrations_are_discoverable() {
        let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).unwrap();
        assert!(!migrations.is_empty());
    }
}
