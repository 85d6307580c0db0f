//! In-memory [`Database`] implementation.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::{payment, pricing, project, Payment, Project},
    infra::{database, Database},
};

/// In-memory [`Database`].
///
/// [`Transact`] shares the state of the [`Memory`] it was started from and
/// [`Commit`] does nothing: every write is visible immediately and nothing is
/// rolled back on failure.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Inner>);

/// Inner state of a [`Memory`] database.
#[derive(Debug, Default)]
struct Inner {
    /// Stored entities.
    state: Mutex<State>,

    /// Number of writes performed so far.
    writes: AtomicUsize,

    /// Indicator whether ledger writes fail.
    ledger_broken: AtomicBool,
}

/// Entities stored in a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`Project`]s.
    projects: HashMap<project::Id, Project>,

    /// Stored [`Payment`]s in the order of their insertion.
    payments: Vec<Payment>,

    /// Stored [`pricing::Selection`]s.
    selections: Vec<pricing::Selection>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of writes performed by this [`Memory`] database.
    #[cfg(test)]
    #[must_use]
    pub fn writes(&self) -> usize {
        self.0.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent [`Payment`] write fail (or succeed again).
    #[cfg(test)]
    pub fn break_ledger(&self, broken: bool) {
        self.0.ledger_broken.store(broken, Ordering::SeqCst);
    }

    /// Registers a write, failing if it touches a broken ledger.
    fn write(&self, ledger: bool) -> Result<(), Traced<database::Error>> {
        if ledger && self.0.ledger_broken.load(Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::from(
                Error::Unavailable
            )));
        }
        _ = self.0.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Storage refused the write.
    #[display("`Memory` storage is unavailable")]
    Unavailable,
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<Project, project::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Project, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Project>, project::Id>>> for Memory {
    type Ok = Option<Project>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Project>, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.state.lock().await.projects.get(&id).cloned())
    }
}

impl Database<Insert<Project>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(project): Insert<Project>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(false).map_err(tracerr::wrap!())?;
        _ = self
            .0
            .state
            .lock()
            .await
            .projects
            .insert(project.id, project);
        Ok(())
    }
}

impl Database<Update<Project>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(project): Update<Project>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(false).map_err(tracerr::wrap!())?;
        let mut state = self.0.state.lock().await;
        if let Some(stored) = state.projects.get_mut(&project.id) {
            *stored = project;
        }
        Ok(())
    }
}

impl Database<Select<By<Vec<Payment>, project::Id>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let project_id = by.into_inner();
        let mut payments = self
            .0
            .state
            .lock()
            .await
            .payments
            .iter()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect::<Vec<_>>();
        payments.reverse();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

impl Database<Select<By<Option<Payment>, payment::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .state
            .lock()
            .await
            .payments
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(true).map_err(tracerr::wrap!())?;
        self.0.state.lock().await.payments.push(payment);
        Ok(())
    }
}

impl Database<Update<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(true).map_err(tracerr::wrap!())?;
        let mut state = self.0.state.lock().await;
        if let Some(stored) =
            state.payments.iter_mut().find(|p| p.id == payment.id)
        {
            *stored = payment;
        }
        Ok(())
    }
}

impl Database<Delete<By<Payment, payment::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(true).map_err(tracerr::wrap!())?;
        self.0.state.lock().await.payments.retain(|p| p.id != id);
        Ok(())
    }
}

impl Database<Select<By<Vec<pricing::Selection>, project::Id>>> for Memory {
    type Ok = Vec<pricing::Selection>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<pricing::Selection>, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let project_id = by.into_inner();
        Ok(self
            .0
            .state
            .lock()
            .await
            .selections
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<pricing::Selection>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(selection): Insert<pricing::Selection>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(false).map_err(tracerr::wrap!())?;
        self.0.state.lock().await.selections.push(selection);
        Ok(())
    }
}
