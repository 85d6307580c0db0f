//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, domain, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Saves the deposit policy of the `Project` with the specified ID and
    /// brings its scheduled deposit entry in line with it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEPOSIT_VALUE_REQUIRED` - the `mode` requires a `value`;
    /// - `NEGATIVE_DEPOSIT_VALUE` - the `value` is negative;
    /// - `DEPOSIT_PERCENT_OUT_OF_RANGE` - the percentage is greater than
    ///                                    `100`;
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "saveDepositConfig",
            mode = ?config.mode,
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
        ),
    )]
    pub async fn save_deposit_config(
        project_id: api::project::Id,
        config: api::deposit::ConfigInput,
        ctx: &Context,
    ) -> Result<api::Project, Error> {
        ctx.service()
            .execute(command::SaveDepositConfig {
                project_id: project_id.into(),
                config: config.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records a payment toward the deposit of the `Project` with the
    /// specified ID.
    ///
    /// `datePaid` defaults to today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NON_POSITIVE_AMOUNT` - the `amount` is not positive;
    /// - `CURRENCY_MISMATCH` - the `amount` currency differs from the
    ///                         `Project` one;
    /// - `EXCEEDS_REMAINING_DEPOSIT` - the `amount` exceeds the remaining
    ///                                 deposit;
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "recordDepositPayment",
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
        ),
    )]
    pub async fn record_deposit_payment(
        project_id: api::project::Id,
        amount: Money,
        description: Option<api::payment::Description>,
        date_paid: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.service()
            .execute(command::RecordDepositPayment {
                project_id: project_id.into(),
                amount,
                description: description.map(Into::into),
                date_paid,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Adds an entry to the ledger of the `Project` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NEGATIVE_AMOUNT` - the `amount` is negative;
    /// - `CURRENCY_MISMATCH` - the `amount` currency differs from the
    ///                         `Project` one;
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "addPayment",
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
            status = ?status,
        ),
    )]
    pub async fn add_payment(
        project_id: api::project::Id,
        amount: Money,
        description: Option<api::payment::Description>,
        status: api::payment::Status,
        date_paid: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.service()
            .execute(command::AddPayment {
                project_id: project_id.into(),
                amount,
                description: description.map(Into::into),
                status: status.into(),
                date_paid,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the ledger entry with the specified ID.
    ///
    /// Updating a `BASE_PRICE` entry updates the base price of its `Project`
    /// too.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NEGATIVE_AMOUNT` - the `amount` is negative;
    /// - `CURRENCY_MISMATCH` - the `amount` currency differs from the
    ///                         `Project` one;
    /// - `PAYMENT_SYSTEM_MANAGED` - the `Payment` is maintained by the
    ///                              system;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "updatePayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_payment(
        id: api::payment::Id,
        amount: Money,
        description: Option<api::payment::Description>,
        status: api::payment::Status,
        date_paid: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.service()
            .execute(command::UpdatePayment {
                payment_id: id.into(),
                amount,
                description: description.map(Into::into),
                status: status.into(),
                date_paid,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the ledger entry with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_SYSTEM_MANAGED` - the `Payment` is maintained by the
    ///                              system;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deletePayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_payment(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.service()
            .execute(command::DeletePayment {
                payment_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Brings the scheduled deposit entry of the `Project` with the
    /// specified ID in line with its deposit policy and its ledger.
    ///
    /// Returns the scheduled deposit entry, if any remains.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reconcileDeposit",
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
        ),
    )]
    pub async fn reconcile_deposit(
        project_id: api::project::Id,
        ctx: &Context,
    ) -> Result<Option<api::Payment>, Error> {
        ctx.service()
            .execute(command::ReconcileDeposit {
                project_id: project_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|entry| entry.map(Into::into))
    }
}

define_error! {
    enum AmountError {
        #[code = "NEGATIVE_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "`Payment` amount cannot be negative"]
        Negative,

        #[code = "NON_POSITIVE_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "Deposit payment amount must be positive"]
        NonPositive,

        #[code = "EXCESSIVE_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "`Payment` amount is too large"]
        Excessive,

        #[code = "CURRENCY_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Amount currency differs from the `Project` one"]
        CurrencyMismatch,
    }
}

define_error! {
    enum ManagedError {
        #[code = "PAYMENT_SYSTEM_MANAGED"]
        #[status = CONFLICT]
        #[message = "`Payment` is maintained by the system and cannot be \
                     changed by hand"]
        SystemManaged,
    }
}

impl AsError for command::save_deposit_config::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use domain::deposit::ValidationError as V;

        define_error! {
            enum Error {
                #[code = "DEPOSIT_VALUE_REQUIRED"]
                #[status = BAD_REQUEST]
                #[message = "Deposit `mode` requires a `value`"]
                ValueRequired,

                #[code = "NEGATIVE_DEPOSIT_VALUE"]
                #[status = BAD_REQUEST]
                #[message = "Deposit `value` cannot be negative"]
                NegativeValue,

                #[code = "DEPOSIT_PERCENT_OUT_OF_RANGE"]
                #[status = BAD_REQUEST]
                #[message = "Deposit percentage must be within `0..=100`"]
                PercentOutOfRange,

                #[code = "DEPOSIT_DUE_LABEL_TOO_LONG"]
                #[status = BAD_REQUEST]
                #[message = "Deposit `dueLabel` cannot exceed 256 characters"]
                DueLabelTooLong,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidConfig(e) => Some(
                match e {
                    V::ValueRequired(_) => Error::ValueRequired,
                    V::NegativeValue(_) => Error::NegativeValue,
                    V::PercentOutOfRange(_) => Error::PercentOutOfRange,
                    V::DueLabelTooLong(_) => Error::DueLabelTooLong,
                }
                .into(),
            ),
            Self::ProjectNotExists(_) => {
                Some(api::ProjectError::NotExists.into())
            }
        }
    }
}

impl AsError for command::record_deposit_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EXCEEDS_REMAINING_DEPOSIT"]
                #[status = BAD_REQUEST]
                #[message = "Deposit payment exceeds the remaining deposit"]
                ExceedsRemaining,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NonPositiveAmount(_) => Some(AmountError::NonPositive.into()),
            Self::ExcessiveAmount(_) => Some(AmountError::Excessive.into()),
            Self::CurrencyMismatch { .. } => {
                Some(AmountError::CurrencyMismatch.into())
            }
            Self::ExceedsRemaining { .. } => Some(
                crate::Error::from(Error::ExceedsRemaining).with_message(self),
            ),
            Self::ProjectNotExists(_) => {
                Some(api::ProjectError::NotExists.into())
            }
        }
    }
}

impl AsError for command::add_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => Some(AmountError::Negative.into()),
            Self::ExcessiveAmount(_) => Some(AmountError::Excessive.into()),
            Self::CurrencyMismatch { .. } => {
                Some(AmountError::CurrencyMismatch.into())
            }
            Self::ProjectNotExists(_) => {
                Some(api::ProjectError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => Some(AmountError::Negative.into()),
            Self::ExcessiveAmount(_) => Some(AmountError::Excessive.into()),
            Self::CurrencyMismatch { .. } => {
                Some(AmountError::CurrencyMismatch.into())
            }
            Self::SystemManaged(_) => Some(ManagedError::SystemManaged.into()),
            Self::PaymentNotExists(_) => {
                Some(api::PaymentError::NotExists.into())
            }
            Self::ProjectNotExists(_) => None,
        }
    }
}

impl AsError for command::delete_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SystemManaged(_) => Some(ManagedError::SystemManaged.into()),
            Self::PaymentNotExists(_) => {
                Some(api::PaymentError::NotExists.into())
            }
            Self::ProjectNotExists(_) => None,
        }
    }
}

impl AsError for command::reconcile_deposit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ProjectNotExists(_) => {
                Some(api::ProjectError::NotExists.into())
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use service::{command, domain::deposit};

    use crate::AsError as _;

    #[test]
    fn overlong_due_label_is_bad_request() {
        let err = command::save_deposit_config::ExecutionError::InvalidConfig(
            deposit::ValidationError::DueLabelTooLong(300),
        )
        .try_as_error()
        .unwrap();

        assert_eq!(err.code, "DEPOSIT_DUE_LABEL_TOO_LONG");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn excessive_amount_is_bad_request() {
        let amount = Money {
            amount: Money::MAX_AMOUNT * rust_decimal::Decimal::TWO,
            currency: Currency::Try,
        };

        for err in [
            command::add_payment::ExecutionError::ExcessiveAmount(amount)
                .try_as_error(),
            command::update_payment::ExecutionError::ExcessiveAmount(amount)
                .try_as_error(),
            command::record_deposit_payment::ExecutionError::ExcessiveAmount(
                amount,
            )
            .try_as_error(),
        ] {
            let err = err.unwrap();
            assert_eq!(err.code, "EXCESSIVE_AMOUNT");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }
}
