//! Bookings Services
use models::*;
use repos::{ReposFactory, Table};
use services::types::ServiceFuture;
use services::{service_error, Service};

pub trait BookingsService {
    /// Records a consultation booking
    fn create_booking(&self, payload: NewBooking) -> ServiceFuture<BookingCreated>;
}

impl<F: ReposFactory> BookingsService for Service<F> {
    fn create_booking(&self, payload: NewBooking) -> ServiceFuture<BookingCreated> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let records_repo = repo_factory.create_records_repo(gateway);
            let booking = Booking::new(payload, now());

            records_repo
                .append(Table::Bookings, booking.to_row())
                .map(|_| BookingCreated::from(&booking))
                .map_err(|e| service_error(e, "Service Bookings, create endpoint error occurred."))
        })
    }
}
