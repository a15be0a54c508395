//! Clinic is a backend for booking doctor consultations, taking mobile-money
//! payments and managing prepaid call coupons.
//! The layered structure of the app is
//!
//! `Application -> Controller -> Service -> Repo + PaymentGateway`
//!
//! Each layer can throw Error with context or cover occurred error with
//! Error in the context. When error is not covered with Error it will
//! be translated to code 500 in the http answer "Internal server error".

#![recursion_limit = "128"]
extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
extern crate hyper;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate percent_encoding;
extern crate rand;
extern crate regex;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate tokio_core;
extern crate tokio_signal;
extern crate tracing_subscriber;
extern crate uuid;
extern crate validator;
#[macro_use]
extern crate validator_derive;

pub mod config;
pub mod controller;
pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod repos;
pub mod services;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use futures::{future, Future, Stream};
use futures_cpupool::CpuPool;
use hyper::server::Http;
use tokio_core::reactor::Core;

use config::Config;
use controller::context::StaticContext;
use controller::{Application, ControllerImpl};
use providers::azampay::AzamPayClient;
use repos::coupons::CouponCacheImpl;
use repos::gateway::{InMemoryGateway, PersistenceGateway, SheetsGateway};
use repos::repo_factory::ReposFactoryImpl;

/// Starts new web service from provided `Config`
pub fn start_server<F: FnOnce() + 'static>(config: Config, port: &Option<String>, callback: F) {
    // Prepare reactor
    let mut core = Core::new().expect("Unexpected error creating event loop core");
    let handle = Arc::new(core.handle());

    let thread_count = config.server.thread_count;

    // Prepare CPU pool
    let cpu_pool = CpuPool::new(thread_count);

    // Prepare server
    let address: SocketAddr = config.address(port).parse().unwrap_or_else(|why| {
        error!("Could not parse address {}: {}", config.address(port), why);
        process::exit(1);
    });

    // Prepare durable store
    let gateway: Arc<PersistenceGateway> = match config.sheets {
        Some(ref sheets) => match SheetsGateway::new(sheets) {
            Ok(gateway) => {
                info!("Using spreadsheet {} as durable store", sheets.spreadsheet_id);
                Arc::new(gateway)
            }
            Err(why) => {
                error!("Spreadsheet Store Initialization Error: {}", why);
                process::exit(1);
            }
        },
        None => {
            warn!("No spreadsheet configured, rows are kept in memory only");
            Arc::new(InMemoryGateway::new())
        }
    };

    // Prepare payment gateway
    let payment_gateway = AzamPayClient::new(config.azampay.clone()).unwrap_or_else(|why| {
        error!("Payment Gateway Initialization Error: {}", why);
        process::exit(1);
    });

    // Repo factory
    let repo_factory = ReposFactoryImpl::new(CouponCacheImpl::default(), config.tables.clone());

    let context = StaticContext::new(cpu_pool, gateway, Arc::new(config), repo_factory, Arc::new(payment_gateway));

    let serve = Http::new()
        .serve_addr_handle(&address, &handle, move || {
            // Prepare application
            let controller = ControllerImpl::new(context.clone());
            let app = Application::new(controller);

            Ok(app)
        })
        .unwrap_or_else(|why| {
            error!("Http Server Initialization Error: {}", why);
            process::exit(1);
        });

    let handle_arc2 = handle.clone();
    handle.spawn(
        serve
            .for_each(move |conn| {
                handle_arc2.spawn(conn.map(|_| ()).map_err(|why| error!("Server Error: {}", why)));
                Ok(())
            })
            .map_err(|_| ()),
    );

    info!("Listening on http://{}, threads: {}", address, thread_count);
    handle.spawn_fn(move || {
        callback();
        future::ok(())
    });

    core.run(tokio_signal::ctrl_c().flatten_stream().take(1u64).for_each(|()| {
        info!("Ctrl+C received. Exit");

        Ok(())
    }))
    .unwrap_or_else(|why| error!("Signal handler Error: {}", why));
}
