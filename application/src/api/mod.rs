//! GraphQL API definitions.

pub mod deposit;
mod mutation;
pub mod payment;
pub mod project;
mod query;
pub mod scalar;
pub mod summary;

use crate::{define_error, Context};

pub use self::{
    mutation::Mutation, payment::Payment, project::Project, query::Query,
    summary::FinancialSummary,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<Context>,
>;

define_error! {
    enum ProjectError {
        #[code = "PROJECT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Project` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` with the specified ID does not exist"]
        NotExists,
    }
}
