//! Admin Services, read-only views over bookings, payments and subscriptions
use models::*;
use repos::{ReposFactory, Table};
use services::types::ServiceFuture;
use services::{service_error, Service};

pub trait AdminService {
    /// Totals and breakdowns for the admin dashboard
    fn dashboard(&self) -> ServiceFuture<DashboardMetrics>;
    /// Payments recorded within the query's date range
    fn payments(&self, query: PaymentsQuery) -> ServiceFuture<Vec<Row>>;
    /// All recorded subscriptions
    fn subscriptions(&self) -> ServiceFuture<Vec<Row>>;
}

impl<F: ReposFactory> AdminService for Service<F> {
    fn dashboard(&self) -> ServiceFuture<DashboardMetrics> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let context = "Service Admin, dashboard endpoint error occurred.";
            let records_repo = repo_factory.create_records_repo(gateway);
            let coupons_repo = repo_factory.create_coupons_repo(gateway);
            let list = |table: Table| records_repo.list(table).map_err(|e| service_error(e, context));

            let bookings = list(Table::Bookings)?;
            let payments = list(Table::Payments)?;
            let subscriptions = list(Table::Subscriptions)?;

            let at = now();
            let active_coupons = coupons_repo
                .list()
                .map_err(|e| service_error(e, context))?
                .iter()
                .filter(|coupon| coupon.is_active && !coupon.is_exhausted() && !coupon.is_expired_at(at))
                .count();

            Ok(DashboardMetrics::new(&bookings, &payments, &subscriptions, active_coupons, at.date()))
        })
    }

    fn payments(&self, query: PaymentsQuery) -> ServiceFuture<Vec<Row>> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let records_repo = repo_factory.create_records_repo(gateway);

            records_repo
                .list(Table::Payments)
                .map(|payments| payments.into_iter().filter(|payment| query.matches(payment)).collect())
                .map_err(|e| service_error(e, "Service Admin, payments endpoint error occurred."))
        })
    }

    fn subscriptions(&self) -> ServiceFuture<Vec<Row>> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let records_repo = repo_factory.create_records_repo(gateway);

            records_repo
                .list(Table::Subscriptions)
                .map_err(|e| service_error(e, "Service Admin, subscriptions endpoint error occurred."))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json;
    use tokio_core::reactor::Core;

    use super::*;
    use errors::{find_error, Error};
    use models::coupons::tests::create_new_coupon;
    use repos::gateway::PersistenceGateway;
    use repos::repo_factory::tests::*;
    use services::bookings::BookingsService;
    use services::coupons::CouponsService;
    use services::subscriptions::SubscriptionsService;

    fn paid_at(gateway: &PersistenceGateway, id: &str, timestamp: &str) {
        let row = row_from(vec![("id", id), ("amount", "5000"), ("country", "Tanzania"), ("timestamp", timestamp)]);
        gateway.append("payments", row).unwrap();
    }

    #[test]
    fn test_dashboard_reads_every_table() {
        let (service, gateway) = create_memory_service();
        let mut core = Core::new().unwrap();
        let booking: NewBooking = serde_json::from_value(json!({"name": "Jane", "doctor_type": "pediatrician", "emergency": true})).unwrap();
        let subscription: NewSubscription =
            serde_json::from_value(json!({"name": "Jane", "phone": "0712345678", "package": "individual_plan", "amount": 15000})).unwrap();
        core.run(service.create_booking(booking)).unwrap();
        core.run(service.create_subscription(subscription)).unwrap();
        core.run(service.create_coupon(create_new_coupon(3))).unwrap();
        paid_at(&gateway, "PY-1", "2024-03-01 09:00:00");

        let metrics = core.run(service.dashboard()).unwrap();

        assert_eq!(metrics.total_bookings, 1);
        assert_eq!(metrics.emergency_bookings, 1);
        assert_eq!(metrics.bookings_by_doctor["pediatrician"], 1);
        assert_eq!(metrics.total_payments, 1);
        assert_eq!(metrics.total_revenue, 5000.0);
        assert_eq!(metrics.total_subscriptions, 1);
        assert_eq!(metrics.active_subscriptions, 1);
        assert_eq!(metrics.active_coupons, 2);
    }

    #[test]
    fn test_payments_within_dates() {
        let (service, gateway) = create_memory_service();
        let mut core = Core::new().unwrap();
        paid_at(&gateway, "PY-1", "2024-02-29 23:00:00");
        paid_at(&gateway, "PY-2", "2024-03-01 09:00:00");
        paid_at(&gateway, "PY-3", "2024-03-05 09:00:00");

        let query = PaymentsQuery {
            start_date: Some(NaiveDate::from_ymd(2024, 3, 1)),
            end_date: None,
        };
        let payments = core.run(service.payments(query)).unwrap();
        let ids: Vec<&str> = payments.iter().map(|payment| payment["id"].as_str()).collect();
        assert_eq!(ids, vec!["PY-2", "PY-3"]);

        assert_eq!(core.run(service.payments(PaymentsQuery::default())).unwrap().len(), 3);
    }

    #[test]
    fn test_subscriptions_with_store_down() {
        let service = create_service(Arc::new(FailingGateway::default()));
        let mut core = Core::new().unwrap();

        let err = core.run(service.subscriptions()).unwrap_err();
        match find_error(&err) {
            Some(&Error::StoreUnavailable) => (),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
