//! [`Project`]-related [`Database`] implementations.

use common::{
    operations::{By, Lock, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{deposit, payment, project, Project},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

impl<C> Database<Select<By<Option<Project>, project::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Project>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Project>, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: project::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, \
                   base_price, base_price_currency, \
                   vat_exempt, \
                   deposit_mode, deposit_value, \
                   deposit_due_label, deposit_description, \
                   snapshot_amount, snapshot_contract_total, \
                   snapshot_locked_at, snapshot_acknowledged_amount, \
                   created_at \
            FROM projects \
            WHERE id = $1::UUID";
        let Some(row) =
            self.query_opt(SQL, &[&id]).await.map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        Ok(Some(Project {
            id: row.get("id"),
            name: row.get("name"),
            base_price: Money {
                amount: row.get("base_price"),
                currency: row.get("base_price_currency"),
            },
            deposit_config: deposit_config(&row).map_err(tracerr::wrap!())?,
            vat_exempt: row.get("vat_exempt"),
            created_at: row.get("created_at"),
        }))
    }
}

/// Reads the [`deposit::Config`] columns of the provided `projects` [`Row`].
///
/// [`None`] is returned if the deposit was never configured.
fn deposit_config(
    row: &Row,
) -> Result<Option<deposit::Config>, Traced<database::Error>> {
    let Some(mode) = row.get::<_, Option<deposit::Mode>>("deposit_mode")
    else {
        return Ok(None);
    };

    let snapshot = match (
        row.get::<_, Option<Decimal>>("snapshot_amount"),
        row.get::<_, Option<Decimal>>("snapshot_contract_total"),
        row.get::<_, Option<deposit::LockDateTime>>("snapshot_locked_at"),
        row.get::<_, Option<Decimal>>("snapshot_acknowledged_amount"),
    ) {
        (None, None, None, None) => None,
        (
            Some(amount),
            Some(contract_total),
            Some(locked_at),
            Some(acknowledged_amount),
        ) => Some(deposit::Snapshot {
            amount,
            contract_total,
            locked_at,
            acknowledged_amount,
        }),
        _ => {
            return Err(tracerr::new!(database::Error::from(
                postgres::Error::MalformedColumn("snapshot"),
            )));
        }
    };

    Ok(Some(deposit::Config {
        mode,
        value: row.get("deposit_value"),
        due_label: row
            .get::<_, Option<deposit::DueLabel>>("deposit_due_label")
            .unwrap_or_default(),
        description: row.get::<_, Option<payment::Description>>(
            "deposit_description",
        ),
        snapshot,
    }))
}

impl<C> Database<Update<Project>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(project): Update<Project>,
    ) -> Result<Self::Ok, Self::Err> {
        let Project {
            id,
            name,
            base_price,
            deposit_config,
            vat_exempt,
            created_at,
        } = project;
        let deposit = deposit_config.as_ref();
        let snapshot = deposit.and_then(|c| c.snapshot.as_ref());

        const SQL: &str = "\
            INSERT INTO projects (\
                id, name, \
                base_price, base_price_currency, \
                vat_exempt, \
                deposit_mode, deposit_value, \
                deposit_due_label, deposit_description, \
                snapshot_amount, snapshot_contract_total, \
                snapshot_locked_at, snapshot_acknowledged_amount, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::NUMERIC, $4::INT2, \
                $5::BOOL, \
                $6::INT2, $7::NUMERIC, \
                $8::VARCHAR, $9::VARCHAR, \
                $10::NUMERIC, $11::NUMERIC, \
                $12::TIMESTAMPTZ, $13::NUMERIC, \
                $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                base_price = EXCLUDED.base_price, \
                base_price_currency = EXCLUDED.base_price_currency, \
                vat_exempt = EXCLUDED.vat_exempt, \
                deposit_mode = EXCLUDED.deposit_mode, \
                deposit_value = EXCLUDED.deposit_value, \
                deposit_due_label = EXCLUDED.deposit_due_label, \
                deposit_description = EXCLUDED.deposit_description, \
                snapshot_amount = EXCLUDED.snapshot_amount, \
                snapshot_contract_total = EXCLUDED.snapshot_contract_total, \
                snapshot_locked_at = EXCLUDED.snapshot_locked_at, \
                snapshot_acknowledged_amount = \
                    EXCLUDED.snapshot_acknowledged_amount";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &base_price.amount,
                &base_price.currency,
                &vat_exempt,
                &deposit.map(|c| c.mode),
                &deposit.and_then(|c| c.value),
                &deposit.map(|c| &c.due_label),
                &deposit.and_then(|c| c.description.as_ref()),
                &snapshot.map(|s| s.amount),
                &snapshot.map(|s| s.contract_total),
                &snapshot.map(|s| &s.locked_at),
                &snapshot.map(|s| s.acknowledged_amount),
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Project, project::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Project, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: project::Id = by.into_inner();

        // Touching the row makes it locked until the transaction ends, even
        // when it exists already.
        const SQL: &str = "\
            INSERT INTO projects_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!()).map(drop)
    }
}
