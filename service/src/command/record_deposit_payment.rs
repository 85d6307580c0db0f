//! [`Command`] for recording a payment toward the deposit of a [`Project`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Currency, Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        deposit::reconciliation::Scope, payment, pricing, project, Payment,
        Project,
    },
    infra::{database, Database},
    read::FinancialSummary,
    Service,
};

use super::{reconcile_deposit::reconcile, Command};

/// [`Command`] for recording a payment toward the deposit of a [`Project`].
#[derive(Clone, Debug)]
pub struct RecordDepositPayment {
    /// ID of the [`Project`] the deposit is paid for.
    pub project_id: project::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`payment::Description`] of the payment, if any.
    pub description: Option<payment::Description>,

    /// [`Date`] the payment was made at.
    ///
    /// Today, if not provided.
    pub date_paid: Option<Date>,
}

impl<Db> Command<RecordDepositPayment> for Service<Db>
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
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(project.id = %cmd.project_id))]
    async fn execute(
        &self,
        cmd: RecordDepositPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordDepositPayment {
            project_id,
            amount,
            description,
            date_paid,
        } = cmd;

        if !amount.is_positive() {
            return Err(tracerr::new!(E::NonPositiveAmount(amount)));
        }
        if amount.is_excessive() {
            return Err(tracerr::new!(E::ExcessiveAmount(amount)));
        }

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
        if amount.currency != project.base_price.currency {
            return Err(tracerr::new!(E::CurrencyMismatch {
                expected: project.base_price.currency,
                actual: amount.currency,
            }));
        }

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let selections = tx
            .execute(Select(By::<Vec<pricing::Selection>, _>::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let remaining = FinancialSummary::build(&project, &payments, &selections)
            .deposit_remaining;
        if remaining.is_positive()
            && amount.amount - remaining.amount
                > self.config().deposit_tolerance
        {
            return Err(tracerr::new!(E::ExceedsRemaining {
                amount,
                remaining,
            }));
        }

        let payment = Payment::deposit(
            project_id,
            amount,
            description,
            date_paid.unwrap_or_else(Date::today),
        );
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        log::info!(%amount, "deposit payment `{}` recorded", payment.id);

        _ = reconcile(&tx, &project, Scope::ExistingOnly)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(payment)
    }
}

/// Error of [`RecordDepositPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Paid amount is zero or negative.
    #[display("Deposit payment must be positive, got `{_0}`")]
    #[from(ignore)]
    NonPositiveAmount(#[error(not(source))] Money),

    /// Amount exceeds the [`Money::MAX_AMOUNT`].
    #[display(
        "`Payment` amount cannot exceed `{}`, got `{_0}`",
        Money::MAX_AMOUNT,
    )]
    #[from(ignore)]
    ExcessiveAmount(#[error(not(source))] Money),

    /// Paid amount exceeds the remaining deposit by more than the tolerance.
    #[display(
        "Deposit payment `{amount}` exceeds the remaining deposit \
         `{remaining}`"
    )]
    #[from(ignore)]
    ExceedsRemaining {
        /// Paid amount.
        amount: Money,

        /// Remaining deposit amount.
        remaining: Money,
    },

    /// Paid amount is in a [`Currency`] other than the [`Project`] one.
    #[display("Expected `{expected}` currency, got `{actual}`")]
    #[from(ignore)]
    CurrencyMismatch {
        /// [`Currency`] of the [`Project`].
        expected: Currency,

        /// [`Currency`] of the paid amount.
        actual: Currency,
    },

    /// [`Project`] doesn't exist.
    #[display("`Project(id: {_0})` does not exist")]
    #[from(ignore)]
    ProjectNotExists(#[error(not(source))] project::Id),
}
