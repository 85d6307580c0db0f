//! [`Command`] definition.

pub mod add_payment;
pub mod delete_payment;
pub mod reconcile_deposit;
pub mod record_deposit_payment;
pub mod save_deposit_config;
pub mod update_payment;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_payment::AddPayment, delete_payment::DeletePayment,
    reconcile_deposit::ReconcileDeposit,
    record_deposit_payment::RecordDepositPayment,
    save_deposit_config::SaveDepositConfig, update_payment::UpdatePayment,
};

#[cfg(test)]
mod spec {
    use common::{operations::Insert, Currency, Date, Money};
    use rust_decimal::Decimal;
    use tracerr::Traced;

    use crate::{
        domain::{
            deposit,
            payment::{self, Kind},
            pricing::{Billing, Catalog, Overrides, Selection},
            project, Payment, Project,
        },
        infra::{Database as _, Memory},
        query, read, Config, Service,
    };

    use super::{
        add_payment, delete_payment, record_deposit_payment,
        save_deposit_config, update_payment, AddPayment, Command as _,
        DeletePayment, ReconcileDeposit, RecordDepositPayment,
        SaveDepositConfig, UpdatePayment,
    };

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.parse().unwrap(),
            currency: Currency::Try,
        }
    }

    fn fixed(value: i64) -> deposit::Config {
        deposit::Config {
            mode: deposit::Mode::Fixed,
            value: Some(value.into()),
            ..deposit::Config::default()
        }
    }

    fn percent(mode: deposit::Mode, value: i64) -> deposit::Config {
        deposit::Config {
            mode,
            value: Some(value.into()),
            ..deposit::Config::default()
        }
    }

    /// Creates a [`Project`] with the base price of `1000` and `200` worth of
    /// extra services.
    async fn setup() -> (Service<Memory>, project::Id) {
        let db = Memory::new();
        let project = Project {
            id: project::Id::new(),
            name: project::Name::new("Summer wedding").unwrap(),
            base_price: money("1000"),
            deposit_config: None,
            vat_exempt: false,
            created_at: project::CreationDateTime::now(),
        };
        let id = project.id;
        db.execute(Insert(project)).await.unwrap();
        db.execute(Insert(Selection {
            project_id: id,
            billing: Billing::Extra,
            quantity: Decimal::ONE,
            catalog: Catalog {
                price: Some(200.into()),
                ..Catalog::default()
            },
            overrides: Overrides::default(),
        }))
        .await
        .unwrap();
        db.execute(Insert(Selection {
            project_id: id,
            billing: Billing::Included,
            quantity: Decimal::ONE,
            catalog: Catalog {
                price: Some(300.into()),
                ..Catalog::default()
            },
            overrides: Overrides::default(),
        }))
        .await
        .unwrap();
        (Service::new(Config::default(), db), id)
    }

    async fn summary(
        service: &Service<Memory>,
        project_id: project::Id,
    ) -> read::FinancialSummary {
        service
            .execute(query::FinancialSummary { project_id })
            .await
            .unwrap()
            .unwrap()
    }

    async fn scheduled(
        service: &Service<Memory>,
        project_id: project::Id,
    ) -> Vec<Payment> {
        service
            .execute(query::payments::ByProject::by(project_id))
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.kind == Kind::DepositDue)
            .collect()
    }

    async fn save(
        service: &Service<Memory>,
        project_id: project::Id,
        config: deposit::Config,
    ) -> Project {
        service
            .execute(SaveDepositConfig { project_id, config })
            .await
            .unwrap()
    }

    async fn record(
        service: &Service<Memory>,
        project_id: project::Id,
        amount: &str,
    ) -> Result<Payment, Traced<record_deposit_payment::ExecutionError>> {
        service
            .execute(RecordDepositPayment {
                project_id,
                amount: money(amount),
                description: None,
                date_paid: Date::from_ymd(2024, 3, 15),
            })
            .await
    }

    #[tokio::test]
    async fn fixed_deposit_paid_in_full() {
        let (service, id) = setup().await;

        let project = save(&service, id, fixed(150)).await;
        let snapshot = project.deposit_config.unwrap().snapshot.unwrap();
        assert_eq!(snapshot.amount, 150.into());
        assert_eq!(snapshot.contract_total, 1200.into());

        let entries = scheduled(&service, id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, money("150"));
        assert_eq!(entries[0].status, payment::Status::Due);
        assert_eq!(
            entries[0].description.as_ref().unwrap().to_string(),
            "Deposit",
        );

        let payment = record(&service, id, "150").await.unwrap();
        assert_eq!(payment.kind, Kind::DepositPayment);
        assert_eq!(payment.deposit_allocation, Some(150.into()));

        let s = summary(&service, id).await;
        assert_eq!(s.deposit_amount, money("150"));
        assert_eq!(s.deposit_status, deposit::Status::Paid);
        assert_eq!(s.deposit_remaining, money("0"));
        assert_eq!(s.contract_total, money("1200"));
        assert_eq!(s.included_totals.gross, 300.into());

        let entries = scheduled(&service, id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, payment::Status::Paid);
        assert_eq!(entries[0].date_paid, Date::from_ymd(2024, 3, 15));
    }

    #[tokio::test]
    async fn over_collection_after_policy_change_is_paid() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        _ = record(&service, id, "150").await.unwrap();

        _ = save(&service, id, percent(deposit::Mode::PercentTotal, 10)).await;

        let s = summary(&service, id).await;
        assert_eq!(s.deposit_amount, money("120"));
        assert_eq!(s.deposit_paid, money("150"));
        assert_eq!(s.deposit_remaining, money("0"));
        assert_eq!(s.deposit_status, deposit::Status::Paid);

        let entries = scheduled(&service, id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, money("120"));
        assert_eq!(entries[0].status, payment::Status::Paid);
    }

    #[tokio::test]
    async fn disabling_deposit_deletes_entry() {
        let (service, id) = setup().await;
        _ = save(&service, id, percent(deposit::Mode::PercentTotal, 10)).await;
        assert_eq!(scheduled(&service, id).await.len(), 1);

        let project = save(&service, id, deposit::Config::default()).await;
        assert!(project.deposit_config.unwrap().snapshot.is_none());

        assert!(scheduled(&service, id).await.is_empty());
        let s = summary(&service, id).await;
        assert_eq!(s.deposit_status, deposit::Status::None);
        assert_eq!(s.deposit_amount, money("0"));
    }

    #[tokio::test]
    async fn rejects_payment_exceeding_remaining() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        let writes = service.database().writes();

        let err = record(&service, id, "200").await.unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                record_deposit_payment::ExecutionError::ExceedsRemaining {
                    remaining,
                    ..
                } if *remaining == money("150"),
            ),
            "unexpected error: {}",
            err.as_ref(),
        );
        assert_eq!(service.database().writes(), writes);
    }

    #[tokio::test]
    async fn tolerates_cent_overpayment() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;

        _ = record(&service, id, "150.01").await.unwrap();
        assert!(record(&service, id, "0").await.is_err());

        let s = summary(&service, id).await;
        assert_eq!(s.deposit_status, deposit::Status::Paid);
        assert_eq!(s.deposit_remaining, money("0"));
    }

    #[tokio::test]
    async fn partial_payments_accumulate() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;

        _ = record(&service, id, "50").await.unwrap();
        let s = summary(&service, id).await;
        assert_eq!(s.deposit_status, deposit::Status::Partial);
        assert_eq!(s.deposit_remaining, money("100"));
        assert_eq!(
            scheduled(&service, id).await[0].status,
            payment::Status::Due,
        );

        _ = record(&service, id, "100").await.unwrap();
        let s = summary(&service, id).await;
        assert_eq!(s.deposit_status, deposit::Status::Paid);
        assert_eq!(s.deposit_paid, money("150"));
        let entry = scheduled(&service, id).await.remove(0);
        assert_eq!(entry.status, payment::Status::Paid);
        assert_eq!(entry.amount, money("150"));
        assert_eq!(s.total_paid, money("300"));
        assert_eq!(s.remaining, money("900"));
    }

    #[tokio::test]
    async fn scheduled_entry_takes_date_of_paid_deposit_payments() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        _ = record(&service, id, "150").await.unwrap();
        _ = save(&service, id, fixed(160)).await;
        let extra = record(&service, id, "10").await.unwrap();

        _ = service
            .execute(UpdatePayment {
                payment_id: extra.id,
                amount: money("10"),
                description: None,
                status: payment::Status::Due,
                date_paid: None,
            })
            .await
            .unwrap();
        _ = save(&service, id, fixed(150)).await;

        let entry = scheduled(&service, id).await.remove(0);
        assert_eq!(entry.status, payment::Status::Paid);
        assert_eq!(entry.date_paid, Date::from_ymd(2024, 3, 15));
    }

    #[tokio::test]
    async fn rejects_excessive_amounts() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        let huge = money("79000000000000000000000000000");

        let err = service
            .execute(AddPayment {
                project_id: id,
                amount: huge,
                description: None,
                status: payment::Status::Paid,
                date_paid: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            add_payment::ExecutionError::ExcessiveAmount(_),
        ));

        let entry = scheduled(&service, id).await.remove(0);
        let err = service
            .execute(UpdatePayment {
                payment_id: entry.id,
                amount: huge,
                description: None,
                status: payment::Status::Paid,
                date_paid: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_payment::ExecutionError::ExcessiveAmount(_),
        ));

        let err = record(&service, id, "1000000000000000.01")
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            record_deposit_payment::ExecutionError::ExcessiveAmount(_),
        ));

        _ = service
            .execute(AddPayment {
                project_id: id,
                amount: money("1000000000000000"),
                description: None,
                status: payment::Status::Paid,
                date_paid: None,
            })
            .await
            .unwrap();
        assert_eq!(
            summary(&service, id).await.total_paid,
            money("1000000000000000"),
        );
    }

    #[tokio::test]
    async fn rejects_overlong_due_label() {
        let (service, id) = setup().await;
        let writes = service.database().writes();

        let err = service
            .execute(SaveDepositConfig {
                project_id: id,
                config: deposit::Config {
                    due_label: deposit::DueLabel::new("x".repeat(1100)),
                    ..fixed(150)
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            save_deposit_config::ExecutionError::InvalidConfig(
                deposit::ValidationError::DueLabelTooLong(1100),
            ),
        ));
        assert_eq!(service.database().writes(), writes);
        assert!(scheduled(&service, id).await.is_empty());

        _ = save(
            &service,
            id,
            deposit::Config {
                due_label: deposit::DueLabel::new("y".repeat(256)),
                ..fixed(150)
            },
        )
        .await;
        let entry = scheduled(&service, id).await.remove(0);
        assert_eq!(entry.description.unwrap().to_string(), "y".repeat(256));
    }

    #[tokio::test]
    async fn payment_without_entry_schedules_nothing() {
        let (service, id) = setup().await;

        _ = record(&service, id, "80").await.unwrap();

        assert!(scheduled(&service, id).await.is_empty());
        assert_eq!(
            summary(&service, id).await.deposit_status,
            deposit::Status::None,
        );
    }

    #[tokio::test]
    async fn rerun_performs_no_writes() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        _ = record(&service, id, "40").await.unwrap();

        let first = service.execute(ReconcileDeposit { project_id: id }).await;
        let writes = service.database().writes();
        let second = service.execute(ReconcileDeposit { project_id: id }).await;

        assert_eq!(service.database().writes(), writes);
        assert_eq!(first.unwrap().unwrap().id, second.unwrap().unwrap().id);
    }

    #[tokio::test]
    async fn stale_entry_self_corrects() {
        let (service, id) = setup().await;

        service.database().break_ledger(true);
        let res = service
            .execute(SaveDepositConfig {
                project_id: id,
                config: fixed(150),
            })
            .await;
        assert!(res.is_err());
        service.database().break_ledger(false);

        assert!(scheduled(&service, id).await.is_empty());
        let project = service
            .execute(query::project::ById::by(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.deposit_config().mode, deposit::Mode::Fixed);

        let entry = service
            .execute(ReconcileDeposit { project_id: id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount, money("150"));
        assert_eq!(scheduled(&service, id).await.len(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let (service, id) = setup().await;
        let writes = service.database().writes();

        let err = service
            .execute(SaveDepositConfig {
                project_id: id,
                config: percent(deposit::Mode::PercentBase, 120),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            save_deposit_config::ExecutionError::InvalidConfig(
                deposit::ValidationError::PercentOutOfRange(_),
            ),
        ));
        assert_eq!(service.database().writes(), writes);
    }

    #[tokio::test]
    async fn unknown_project_is_reported() {
        let (service, _) = setup().await;
        let unknown = project::Id::new();

        let err = service
            .execute(SaveDepositConfig {
                project_id: unknown,
                config: fixed(10),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            save_deposit_config::ExecutionError::ProjectNotExists(id)
                if *id == unknown,
        ));
        assert!(service
            .execute(query::FinancialSummary { project_id: unknown })
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn scheduled_entry_is_not_editable() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        let entry = scheduled(&service, id).await.remove(0);

        let err = service
            .execute(UpdatePayment {
                payment_id: entry.id,
                amount: money("1"),
                description: None,
                status: payment::Status::Paid,
                date_paid: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_payment::ExecutionError::SystemManaged(_),
        ));

        let err = service
            .execute(DeletePayment {
                payment_id: entry.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            delete_payment::ExecutionError::SystemManaged(_),
        ));
    }

    #[tokio::test]
    async fn manual_entries_count_toward_totals_only() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;

        let paid = service
            .execute(AddPayment {
                project_id: id,
                amount: money("400"),
                description: payment::Description::new("Venue"),
                status: payment::Status::Paid,
                date_paid: None,
            })
            .await
            .unwrap();
        assert_eq!(paid.kind, Kind::Manual);
        assert_eq!(paid.date_paid, Some(Date::today()));
        _ = service
            .execute(AddPayment {
                project_id: id,
                amount: money("70"),
                description: None,
                status: payment::Status::Due,
                date_paid: Date::from_ymd(2024, 1, 1),
            })
            .await
            .unwrap();

        let s = summary(&service, id).await;
        assert_eq!(s.total_paid, money("400"));
        assert_eq!(s.remaining, money("800"));
        assert_eq!(s.total_outstanding, money("220"));
        assert_eq!(s.deposit_status, deposit::Status::Due);

        let err = service
            .execute(AddPayment {
                project_id: id,
                amount: money("-1"),
                description: None,
                status: payment::Status::Due,
                date_paid: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            add_payment::ExecutionError::NegativeAmount(_),
        ));
    }

    #[tokio::test]
    async fn base_price_edit_moves_percent_deposit() {
        let (service, id) = setup().await;
        let mut base = Payment::manual(
            id,
            money("1000"),
            payment::Description::new("Base price"),
            payment::Status::Due,
            None,
        );
        base.kind = Kind::BasePrice;
        service.database().execute(Insert(base.clone())).await.unwrap();
        _ = save(&service, id, percent(deposit::Mode::PercentBase, 10)).await;
        assert_eq!(scheduled(&service, id).await[0].amount, money("100"));

        _ = service
            .execute(UpdatePayment {
                payment_id: base.id,
                amount: money("2000"),
                description: base.description.clone(),
                status: payment::Status::Due,
                date_paid: None,
            })
            .await
            .unwrap();

        let project = service
            .execute(query::project::ById::by(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.base_price, money("2000"));
        assert_eq!(scheduled(&service, id).await[0].amount, money("200"));
        assert_eq!(summary(&service, id).await.contract_total, money("2200"));
    }

    #[tokio::test]
    async fn deleting_deposit_payment_reopens_entry() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        let payment = record(&service, id, "150").await.unwrap();
        assert_eq!(
            scheduled(&service, id).await[0].status,
            payment::Status::Paid,
        );

        _ = service
            .execute(DeletePayment {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        let entry = scheduled(&service, id).await.remove(0);
        assert_eq!(entry.status, payment::Status::Due);
        assert_eq!(entry.date_paid, None);
        assert_eq!(
            summary(&service, id).await.deposit_status,
            deposit::Status::Due,
        );
    }

    #[tokio::test]
    async fn editing_deposit_payment_updates_allocation() {
        let (service, id) = setup().await;
        _ = save(&service, id, fixed(150)).await;
        let payment = record(&service, id, "150").await.unwrap();

        let updated = service
            .execute(UpdatePayment {
                payment_id: payment.id,
                amount: money("90"),
                description: None,
                status: payment::Status::Paid,
                date_paid: Date::from_ymd(2024, 3, 20),
            })
            .await
            .unwrap();

        assert_eq!(updated.deposit_allocation, Some(90.into()));
        let s = summary(&service, id).await;
        assert_eq!(s.deposit_status, deposit::Status::Partial);
        assert_eq!(s.deposit_last_payment_date, Date::from_ymd(2024, 3, 20));
        assert_eq!(
            scheduled(&service, id).await[0].status,
            payment::Status::Due,
        );
    }
}
