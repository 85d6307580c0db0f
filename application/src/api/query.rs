//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Project` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "project",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn project(
        id: api::project::Id,
        ctx: &Context,
    ) -> Result<api::Project, Error> {
        ctx.service()
            .execute(query::project::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::ProjectError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the ledger of the `Project` with the specified ID, newest
    /// `Payment`s first.
    ///
    /// Empty if the `Project` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "payments",
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
        ),
    )]
    pub async fn payments(
        project_id: api::project::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        ctx.service()
            .execute(query::payments::ByProject::by(project_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|payments| payments.into_iter().map(Into::into).collect())
    }

    /// Returns the financial state of the `Project` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROJECT_NOT_EXISTS` - the `Project` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "financialSummary",
            otel.name = Self::SPAN_NAME,
            project.id = %project_id,
        ),
    )]
    pub async fn financial_summary(
        project_id: api::project::Id,
        ctx: &Context,
    ) -> Result<api::FinancialSummary, Error> {
        ctx.service()
            .execute(query::FinancialSummary {
                project_id: project_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::ProjectError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}
