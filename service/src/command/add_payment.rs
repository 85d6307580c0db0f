//! [`Command`] for adding a [`Payment`] to a [`Project`] ledger.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Currency, Date, Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{payment, project, Payment, Project},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a [`payment::Kind::Manual`] [`Payment`] to a
/// [`Project`] ledger.
#[derive(Clone, Debug)]
pub struct AddPayment {
    /// ID of the [`Project`] to add the [`Payment`] to.
    pub project_id: project::Id,

    /// Amount of the [`Payment`].
    pub amount: Money,

    /// [`payment::Description`] of the [`Payment`], if any.
    pub description: Option<payment::Description>,

    /// [`payment::Status`] of the [`Payment`].
    pub status: payment::Status,

    /// [`Date`] the [`Payment`] was paid at.
    ///
    /// Ignored unless the [`Payment`] is paid.
    pub date_paid: Option<Date>,
}

impl<Db> Command<AddPayment> for Service<Db>
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
        > + Database<Insert<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AddPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddPayment {
            project_id,
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

        let payment =
            Payment::manual(project_id, amount, description, status, date_paid);
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(payment)
    }
}

/// Error of [`AddPayment`] [`Command`] execution.
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

    /// [`Project`] doesn't exist.
    #[display("`Project(id: {_0})` does not exist")]
    #[from(ignore)]
    ProjectNotExists(#[error(not(source))] project::Id),
}
