//! [`Command`] for updating a [`Payment`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Currency, Date, Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        deposit::reconciliation::Scope, payment, pricing, project, Payment,
        Project,
    },
    infra::{database, Database},
    Service,
};

use super::{reconcile_deposit::reconcile, Command};

/// [`Command`] for updating a [`Payment`] entered by hand.
///
/// Updating a [`payment::Kind::BasePrice`] entry updates the base price of
/// its [`Project`] too.
#[derive(Clone, Debug)]
pub struct UpdatePayment {
    /// ID of the [`Payment`] to update.
    pub payment_id: payment::Id,

    /// New amount of the [`Payment`].
    pub amount: Money,

    /// New [`payment::Description`] of the [`Payment`].
    pub description: Option<payment::Description>,

    /// New [`payment::Status`] of the [`Payment`].
    pub status: payment::Status,

    /// New [`Date`] the [`Payment`] was paid at.
    pub date_paid: Option<Date>,
}

impl<Db> Command<UpdatePayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
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
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(payment.id = %cmd.payment_id))]
    async fn execute(
        &self,
        cmd: UpdatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePayment {
            payment_id,
            amount,
            description,
            status,
            date_paid,
        } = cmd;

        if amount.amount < Decimal::ZERO {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }
        if amount.is_excessive() {
            return Err(tracerr::new!(E::ExcessiveAmount(amount)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let project_id = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?
            .project_id;

        // Avoid concurrent actions upon the same `Project`.
        tx.execute(Lock(By::new(project_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Re-read under the lock.
        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        if payment.is_system_managed() {
            return Err(tracerr::new!(E::SystemManaged(payment_id)));
        }

        let mut project = tx
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

        payment.amount = amount;
        payment.description = description;
        payment.status = status;
        payment.date_paid = status.date_paid(date_paid);
        payment.updated_at = payment::ModificationDateTime::now();
        if payment.kind == payment::Kind::DepositPayment {
            payment.deposit_allocation = Some(amount.amount);
        }
        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let scope = match payment.kind {
            payment::Kind::BasePrice => {
                log::info!(
                    "base price of `Project(id: {project_id})` changed from \
                     `{}` to `{amount}`",
                    project.base_price,
                );
                project.base_price = amount;
                tx.execute(Update(project.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                Some(Scope::Full)
            }
            payment::Kind::DepositPayment => Some(Scope::ExistingOnly),
            payment::Kind::Manual | payment::Kind::DepositDue => None,
        };
        if let Some(scope) = scope {
            _ = reconcile(&tx, &project, scope)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(payment)
    }
}

/// Error of [`UpdatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Amount is negative.
    #[display("`Payment` amount cannot be negative, got `{_0}`")]
    #[from(ignore)]
    NegativeAmount(#[error(not(source))] Money),

    /// Amount exceeds the [`Money::MAX_AMOUNT`].
    #[display(
        "`Payment` amount cannot exceed `{}`, got `{_0}`",
        Money::MAX_AMOUNT,
    )]
    #[from(ignore)]
    ExcessiveAmount(#[error(not(source))] Money),

    /// Amount is in a [`Currency`] other than the [`Project`] one.
    #[display("Expected `{expected}` currency, got `{actual}`")]
    #[from(ignore)]
    CurrencyMismatch {
        /// [`Currency`] of the [`Project`].
        expected: Currency,

        /// [`Currency`] of the amount.
        actual: Currency,
    },

    /// [`Payment`] is maintained by the deposit reconciliation only.
    #[display("`Payment(id: {_0})` is managed by the system")]
    #[from(ignore)]
    SystemManaged(#[error(not(source))] payment::Id),

    /// [`Payment`] doesn't exist.
    #[display("`Payment(id: {_0})` does not exist")]
    #[from(ignore)]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`Project`] doesn't exist.
    #[display("`Project(id: {_0})` does not exist")]
    #[from(ignore)]
    ProjectNotExists(#[error(not(source))] project::Id),
}
