//! [`refinery`] migrations of the [`Postgres`] schema.

use async_trait::async_trait;
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{self, postgres};

use super::Postgres;

/// Applies the migrations embedded by [`embed_migrations!`] missing in the
/// [`Postgres`] schema.
///
/// # Errors
///
/// If any of the migrations fails to apply.
///
/// [`embed_migrations!`]: postgres::embed_migrations
pub async fn run(
    db: &mut Postgres,
    runner: refinery::Runner,
) -> Result<(), refinery::Error> {
    let report = runner.run_async(db).await?;
    for m in report.applied_migrations() {
        log::info!("applied `{m}` migration");
    }
    Ok(())
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self.0.connection().await.map_err(tracerr::wrap!())?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, <Self as AsyncTransaction>::Error> {
        let mut conn = self.0.connection().await.map_err(tracerr::wrap!())?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl AsyncMigrate for Postgres {}
