//! [`Project`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A client engagement tracked by the ledger.
#[derive(Clone, Debug)]
pub struct Project {
    /// ID of this [`Project`].
    pub id: Id,

    /// [`domain::Project`] representing this [`Project`].
    project: OnceCell<domain::Project>,
}

impl From<domain::Project> for Project {
    fn from(project: domain::Project) -> Self {
        Self {
            id: project.id.into(),
            project: OnceCell::new_with(Some(project)),
        }
    }
}

impl Project {
    /// Returns the [`domain::Project`] representing this [`Project`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Project`] doesn't exist.
    async fn project(&self, ctx: &Context) -> Result<&domain::Project, Error> {
        let id = self.id.into();
        self.project
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::project::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(
                            p.ok_or_else(|| api::ProjectError::NotExists.into())
                                .map_err(ctx.error()),
                        )
                    })
            })
            .await
    }
}

/// A client engagement tracked by the ledger.
#[graphql_object(context = Context)]
impl Project {
    /// Unique identifier of this `Project`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Project`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.project(ctx).await?.name.clone().into())
    }

    /// Base price of this `Project`, excluding add-on services.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.basePrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn base_price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.project(ctx).await?.base_price)
    }

    /// Indicator whether this `Project` is billed without VAT.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.vatExempt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn vat_exempt(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.project(ctx).await?.vat_exempt)
    }

    /// Deposit policy of this `Project`.
    ///
    /// A `Project` which never had its deposit configured requires no
    /// deposit.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.depositConfig",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deposit_config(
        &self,
        ctx: &Context,
    ) -> Result<api::deposit::Config, Error> {
        Ok(self.project(ctx).await?.deposit_config().into())
    }

    /// Ledger of this `Project`, newest `Payment`s first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.payments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        ctx.service()
            .execute(query::payments::ByProject::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|payments| payments.into_iter().map(Into::into).collect())
    }

    /// Financial state of this `Project`.
    ///
    /// Always computed from the current ledger.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.summary",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn summary(
        &self,
        ctx: &Context,
    ) -> Result<api::FinancialSummary, Error> {
        ctx.service()
            .execute(query::FinancialSummary {
                project_id: self.id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::ProjectError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// `DateTime` when this `Project` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Project.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.project(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Project`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::project::Id)]
#[into(domain::project::Id)]
#[graphql(name = "ProjectId", transparent)]
pub struct Id(Uuid);

/// Name of a `Project`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ProjectName",
    with = scalar::Via::<domain::project::Name>,
)]
pub struct Name(domain::project::Name);
