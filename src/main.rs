//! Clinic is a backend for booking consultations and managing call coupons.
//! This crate is for running the service from `clinic_lib`. See `clinic_lib` for details.

extern crate clinic_lib;

fn main() {
    let config = clinic_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    if let Err(e) = clinic_lib::logging::init(&config.logging) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    clinic_lib::start_server(config, &None, || ());
}
