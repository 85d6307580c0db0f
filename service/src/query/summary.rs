//! [`Query`] of the [`read::FinancialSummary`] of a [`Project`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{pricing, project, Payment, Project},
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// Queries the [`read::FinancialSummary`] of a [`Project`].
///
/// The summary is built from fresh reads on every execution.
#[derive(Clone, Copy, Debug)]
pub struct FinancialSummary {
    /// ID of the [`Project`] to summarize.
    pub project_id: project::Id,
}

impl<Db> Query<FinancialSummary> for Service<Db>
where
    Db: Database<
            Select<By<Option<Project>, project::Id>>,
            Ok = Option<Project>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, project::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<pricing::Selection>, project::Id>>,
            Ok = Vec<pricing::Selection>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<read::FinancialSummary>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        FinancialSummary { project_id }: FinancialSummary,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(project) = self
            .database()
            .execute(Select(By::<Option<Project>, _>::new(project_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        let payments = self
            .database()
            .execute(Select(By::<Vec<Payment>, _>::new(project_id)))
            .await
            .map_err(tracerr::wrap!())?;
        let selections = self
            .database()
            .execute(Select(By::<Vec<pricing::Selection>, _>::new(project_id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Some(read::FinancialSummary::build(
            &project,
            &payments,
            &selections,
        )))
    }
}
