//! [`Command`] for saving a [`deposit::Config`] of a [`Project`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        deposit::{self, reconciliation::Scope},
        payment, pricing, project, Payment, Project,
    },
    infra::{database, Database},
    read::FinancialSummary,
    Service,
};

use super::{reconcile_deposit::reconcile, Command};

/// [`Command`] for saving a [`deposit::Config`] of a [`Project`].
///
/// The new [`deposit::Config`] replaces the previous one wholesale, and the
/// scheduled deposit entry is reconciled with it right away.
#[derive(Clone, Debug)]
pub struct SaveDepositConfig {
    /// ID of the [`Project`] to save the [`deposit::Config`] of.
    pub project_id: project::Id,

    /// [`deposit::Config`] to be saved.
    ///
    /// Its [`deposit::Snapshot`] is ignored and taken anew.
    pub config: deposit::Config,
}

impl<Db> Command<SaveDepositConfig> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Project>, project::Id>>,
            Ok = Option<Project>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Project, project::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Project>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<Payment>, project::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<pricing::Selection>, project::Id>>,
            Ok = Vec<pricing::Selection>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Delete<By<Payment, payment::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Project;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(project.id = %cmd.project_id))]
    async fn execute(
        &self,
        cmd: SaveDepositConfig,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SaveDepositConfig {
            project_id,
            mut config,
        } = cmd;

        config.validate().map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Project`.
        tx.execute(Lock(By::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut project = tx
            .execute(Select(By::<Option<Project>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProjectNotExists(project_id))
            .map_err(tracerr::wrap!())?;

        config.snapshot = None;
        project.deposit_config = Some(config);

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let selections = tx
            .execute(Select(By::<Vec<pricing::Selection>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let summary = FinancialSummary::build(&project, &payments, &selections);
        if let Some(config) = &mut project.deposit_config {
            config.snapshot = deposit::Snapshot::take(
                summary.deposit_amount.amount,
                summary.contract_total.amount,
            );
        }

        tx.execute(Update(project.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        log::info!(
            amount = %summary.deposit_amount,
            "deposit configuration saved",
        );

        _ = reconcile(&tx, &project, Scope::Full)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(project)
    }
}

/// Error of [`SaveDepositConfig`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`deposit::Config`] is invalid.
    #[display("Invalid deposit configuration: {_0}")]
    InvalidConfig(deposit::ValidationError),

    /// [`Project`] doesn't exist.
    #[display("`Project(id: {_0})` does not exist")]
    #[from(ignore)]
    ProjectNotExists(#[error(not(source))] project::Id),
}
