//! [`Command`] for reconciling the scheduled deposit entry of a [`Project`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        deposit::reconciliation::{self, Action, Scope, Target},
        payment, pricing, project, Ledger, Payment, Project,
    },
    infra::{database, Database},
    read::FinancialSummary,
    Service,
};

use super::Command;

/// [`Command`] for reconciling the scheduled deposit entry of a [`Project`]
/// with its deposit policy and the deposit payments recorded so far.
#[derive(Clone, Copy, Debug, From)]
pub struct ReconcileDeposit {
    /// ID of the [`Project`] to reconcile.
    pub project_id: project::Id,
}

impl<Db> Command<ReconcileDeposit> for Service<Db>
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
        > + Database<
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
    type Ok = Option<Payment>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReconcileDeposit,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReconcileDeposit { project_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Project`.
        tx.execute(Lock(By::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let project = tx
            .execute(Select(By::<Option<Project>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProjectNotExists(project_id))
            .map_err(tracerr::wrap!())?;

        let entry = reconcile(&tx, &project, Scope::Full)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(entry)
    }
}

/// Brings the scheduled deposit entry of the provided [`Project`] in line
/// with its deposit policy, using the provided [`Database`] connection.
///
/// Returns the scheduled deposit entry, if there is one afterwards.
///
/// Running it again with unchanged inputs performs no writes.
#[tracing::instrument(skip_all, fields(project.id = %project.id, ?scope))]
pub(crate) async fn reconcile<Tx>(
    tx: &Tx,
    project: &Project,
    scope: Scope,
) -> Result<Option<Payment>, Traced<database::Error>>
where
    Tx: Database<
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
        >,
{
    let payments = tx
        .execute(Select(By::<Vec<Payment>, _>::new(project.id)))
        .await
        .map_err(tracerr::wrap!())?;
    let selections = tx
        .execute(Select(By::<Vec<pricing::Selection>, _>::new(project.id)))
        .await
        .map_err(tracerr::wrap!())?;

    let summary = FinancialSummary::build(project, &payments, &selections);
    let target = Target {
        amount: summary.deposit_amount,
        deposit_paid: summary.deposit_paid.amount,
        latest_payment_date: Ledger(&payments).latest_paid_deposit_date(),
        description: project.deposit_config().entry_description(),
    };
    let plan =
        reconciliation::plan(project.id, &target, Ledger(&payments), scope);
    if plan.is_noop() {
        log::debug!("scheduled deposit entry is up to date");
        return Ok(plan.entry().cloned());
    }

    for id in plan.stale {
        log::warn!("deleting duplicated scheduled deposit entry `{id}`");
        tx.execute(Delete(By::<Payment, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
    }

    match plan.action {
        Action::Insert(entry) => {
            log::info!(amount = %entry.amount, "scheduling deposit entry");
            tx.execute(Insert(entry.clone()))
                .await
                .map_err(tracerr::wrap!())?;
            Ok(Some(entry))
        }
        Action::Update(entry) => {
            log::info!(
                amount = %entry.amount,
                status = %entry.status,
                "updating scheduled deposit entry `{}`",
                entry.id,
            );
            tx.execute(Update(entry.clone()))
                .await
                .map_err(tracerr::wrap!())?;
            Ok(Some(entry))
        }
        Action::Delete(id) => {
            log::info!("deleting scheduled deposit entry `{id}`");
            tx.execute(Delete(By::<Payment, _>::new(id)))
                .await
                .map_err(tracerr::wrap!())?;
            Ok(None)
        }
        Action::Keep(entry) => Ok(Some(entry)),
        Action::Nothing => Ok(None),
    }
}

/// Error of [`ReconcileDeposit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Project`] doesn't exist.
    #[display("`Project(id: {_0})` does not exist")]
    #[from(ignore)]
    ProjectNotExists(#[error(not(source))] project::Id),
}
