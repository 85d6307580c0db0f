//! [`pricing::Selection`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        pricing::{self, Catalog, Overrides},
        project,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<pricing::Selection>, project::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<pricing::Selection>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<pricing::Selection>, project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let project_id: project::Id = by.into_inner();

        const SQL: &str = "\
            SELECT ps.project_id, ps.billing, ps.quantity, \
                   ps.unit_price, ps.vat_rate, ps.vat_mode, \
                   s.selling_price AS catalog_selling_price, \
                   s.price AS catalog_price, \
                   s.vat_rate AS catalog_vat_rate, \
                   s.price_includes_vat AS catalog_price_includes_vat \
            FROM project_services AS ps \
            INNER JOIN services AS s ON s.id = ps.service_id \
            WHERE ps.project_id = $1::UUID \
            ORDER BY ps.created_at";
        Ok(self
            .query(SQL, &[&project_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| pricing::Selection {
                project_id: row.get("project_id"),
                billing: row.get("billing"),
                quantity: row.get("quantity"),
                catalog: Catalog {
                    selling_price: row.get("catalog_selling_price"),
                    price: row.get("catalog_price"),
                    vat_rate: row.get("catalog_vat_rate"),
                    price_includes_vat: row.get("catalog_price_includes_vat"),
                },
                overrides: Overrides {
                    unit_price: row.get("unit_price"),
                    vat_rate: row.get("vat_rate"),
                    vat_mode: row.get("vat_mode"),
                },
            })
            .collect())
    }
}
