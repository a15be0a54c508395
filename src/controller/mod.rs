//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod context;
pub mod routes;
pub mod types;
pub mod utils;

use std::sync::Arc;

use failure::{Error as FailureError, Fail};
use futures::future;
use futures::Future;
use hyper;
use hyper::server::{Request, Response, Service as HttpService};
use hyper::{Method, StatusCode};
use serde::Serialize;
use serde_json;

use errors::{error_chain, find_error, Error};
use models::*;
use repos::repo_factory::ReposFactory;
use services::admin::AdminService;
use services::bookings::BookingsService;
use services::coupons::CouponsService;
use services::payments::PaymentsService;
use services::subscriptions::SubscriptionsService;
use services::system::SystemService;
use services::Service;

use self::context::StaticContext;
use self::routes::{create_route_parser, Route, RouteParser};
use self::types::{ControllerFuture, Reply};
use self::utils::parse_body;

macro_rules! serialize_future {
    ($e:expr) => {
        Box::new($e.and_then(|resp| serde_json::to_string(&resp).map(Reply::ok).map_err(FailureError::from)))
    };
}

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<F: ReposFactory> {
    pub static_context: StaticContext<F>,
    pub route_parser: Arc<RouteParser<Route>>,
}

impl<F: ReposFactory> ControllerImpl<F> {
    /// Create a new controller based on services
    pub fn new(static_context: StaticContext<F>) -> Self {
        let route_parser = Arc::new(create_route_parser());
        Self {
            static_context,
            route_parser,
        }
    }

    /// Handle a request and get future response
    pub fn call(&self, req: Request) -> ControllerFuture {
        let service = Service::new(self.static_context.clone());
        let method = req.method().clone();
        let path = req.path().to_string();
        debug!("Received request {} {}", method, path);

        match (&method, self.route_parser.test(&path)) {
            // GET /api/health
            (&Method::Get, Some(Route::Health)) => serialize_future!(service.healthcheck()),

            // POST /api/bookings
            (&Method::Post, Some(Route::Bookings)) => {
                serialize_future!(parse_body::<NewBooking>(req.body()).and_then(move |payload| service.create_booking(payload)))
            }

            // POST /api/payments
            (&Method::Post, Some(Route::Payments)) => {
                serialize_future!(parse_body::<NewPayment>(req.body()).and_then(move |payload| service.create_payment(payload)))
            }

            // POST /api/payments/azampay/checkout
            (&Method::Post, Some(Route::AzamPayCheckout)) => {
                serialize_future!(parse_body::<CheckoutPayload>(req.body()).and_then(move |payload| service.checkout(payload)))
            }

            // POST /api/payments/azampay/callback
            (&Method::Post, Some(Route::AzamPayCallback)) => {
                serialize_future!(parse_body::<CallbackPayload>(req.body()).and_then(move |payload| service.handle_callback(payload)))
            }

            // GET /api/payments/azampay/status/<transaction_id>
            (&Method::Get, Some(Route::AzamPayStatus(transaction_id))) => serialize_future!(service.payment_status(transaction_id)),

            // POST /api/subscriptions
            (&Method::Post, Some(Route::Subscriptions)) => serialize_future!(
                parse_body::<NewSubscription>(req.body()).and_then(move |payload| service.create_subscription(payload))
            ),

            // POST /api/coupons
            (&Method::Post, Some(Route::Coupons)) => serialize_future!(
                parse_body::<NewCoupon>(req.body())
                    .and_then(move |payload| service.create_coupon(payload))
                    .map(|coupon| CouponCreated::from(&coupon))
            ),

            // POST /api/coupons/validate
            (&Method::Post, Some(Route::CouponsValidate)) => Box::new(
                parse_body::<ValidateCouponPayload>(req.body())
                    .and_then(move |payload| service.validate_coupon(payload))
                    .and_then(|result| coupon_reply(result.is_valid(), &CouponValidationResponse::from(result))),
            ),

            // POST /api/coupons/use
            (&Method::Post, Some(Route::CouponsUse)) => Box::new(
                parse_body::<RedeemCouponPayload>(req.body())
                    .and_then(move |payload| service.redeem_coupon(payload))
                    .and_then(|result| coupon_reply(result.is_valid(), &CouponRedemptionResponse::from(result))),
            ),

            // GET /api/coupons/user/<phone>
            (&Method::Get, Some(Route::CouponsForPhone(phone))) => {
                serialize_future!(service.list_coupons_for_phone(phone).map(CouponList::from))
            }

            // GET /api/admin/dashboard
            (&Method::Get, Some(Route::AdminDashboard)) => serialize_future!(service.dashboard()),

            // GET /api/admin/payments?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
            (&Method::Get, Some(Route::AdminPayments)) => serialize_future!(
                future::result(PaymentsQuery::from_query(req.query())).and_then(move |query| service.payments(query))
            ),

            // GET /api/admin/subscriptions
            (&Method::Get, Some(Route::AdminSubscriptions)) => serialize_future!(service.subscriptions()),

            (_, Some(route)) => Box::new(future::err(FailureError::from(
                Error::NotFound.context(format!("{} is not served on {:?}", method, route)),
            ))),

            // Fallback
            (_, None) => Box::new(future::err(FailureError::from(
                Error::NotFound.context(format!("No route for {} {}", method, path)),
            ))),
        }
    }
}

/// Invalid coupons are answered with 400 and the same body shape as valid ones
fn coupon_reply<T: Serialize>(valid: bool, response: &T) -> Result<Reply, FailureError> {
    let status = if valid { StatusCode::Ok } else { StatusCode::BadRequest };
    serde_json::to_string(response).map(|body| Reply::new(status, body)).map_err(From::from)
}

/// Error body `{success: false, code, message}`. Untyped errors become 500.
pub fn error_reply(err: &FailureError) -> Reply {
    let (status, message) = match find_error(err) {
        Some(e) => (e.code(), e.message()),
        None => (StatusCode::InternalServerError, "Internal server error".to_string()),
    };

    if status == StatusCode::InternalServerError {
        error!("{}", error_chain(err));
    } else {
        warn!("{}", error_chain(err));
    }

    let body = json!({
        "success": false,
        "code": u16::from(status),
        "message": message,
    });
    Reply::new(status, body.to_string())
}

/// Hyper service wrapping the controller
pub struct Application<F: ReposFactory> {
    controller: ControllerImpl<F>,
}

impl<F: ReposFactory> Application<F> {
    pub fn new(controller: ControllerImpl<F>) -> Self {
        Self { controller }
    }
}

impl<F: ReposFactory> HttpService for Application<F> {
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, req: Request) -> Self::Future {
        Box::new(self.controller.call(req).then(|result| {
            let reply = match result {
                Ok(reply) => reply,
                Err(err) => error_reply(&err),
            };
            future::ok::<Response, hyper::Error>(reply.into_response())
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyper::Uri;
    use std::str::FromStr;
    use tokio_core::reactor::Core;

    use super::*;
    use controller::utils::read_body;
    use models::coupons::tests::create_new_coupon;
    use repos::gateway::InMemoryGateway;
    use repos::repo_factory::tests::create_context;
    use repos::ReposFactoryImpl;

    fn create_controller() -> ControllerImpl<ReposFactoryImpl> {
        ControllerImpl::new(create_context(Arc::new(InMemoryGateway::new()), 1))
    }

    fn request(method: Method, path: &str, body: Option<String>) -> Request {
        let mut req = Request::new(method, Uri::from_str(path).unwrap());
        if let Some(body) = body {
            req.set_body(body);
        }
        req
    }

    fn respond(core: &mut Core, app: &Application<ReposFactoryImpl>, req: Request) -> (StatusCode, serde_json::Value) {
        let response = core.run(app.call(req)).unwrap();
        let status = response.status();
        let body = core.run(read_body(response.body())).unwrap();
        (status, serde_json::from_str(&body).unwrap())
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());

        let (status, body) = respond(&mut core, &app, request(Method::Get, "/api/doctors", None));

        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], 404);
    }

    #[test]
    fn test_broken_json_is_unprocessable() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());

        let (status, body) = respond(&mut core, &app, request(Method::Post, "/api/coupons/use", Some("{".to_string())));

        assert_eq!(status, StatusCode::UnprocessableEntity);
        assert_eq!(body["code"], 422);
    }

    #[test]
    fn test_coupon_lifecycle_over_http() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());
        let new_coupon = serde_json::to_string(&create_new_coupon(1)).unwrap();

        let (status, created) = respond(&mut core, &app, request(Method::Post, "/api/coupons", Some(new_coupon)));
        assert_eq!(status, StatusCode::Ok);
        let code = created["coupon"]["code"].as_str().unwrap().to_string();

        let redeem = json!({ "coupon_code": code.to_lowercase() }).to_string();
        let (status, used) = respond(&mut core, &app, request(Method::Post, "/api/coupons/use", Some(redeem.clone())));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(used["success"], true);
        assert_eq!(used["calls_remaining"], 0);

        let (status, rejected) = respond(&mut core, &app, request(Method::Post, "/api/coupons/use", Some(redeem)));
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(rejected["valid"], false);
        assert_eq!(rejected["reason"], "CallsExhausted");

        let (status, listed) = respond(&mut core, &app, request(Method::Get, "/api/coupons/user/255712345678", None));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(listed["data"][0]["code"], code.as_str());
        assert_eq!(listed["message"], "Found 1 coupons");
    }

    #[test]
    fn test_missing_coupon_code_is_bad_request() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());

        let (status, body) = respond(&mut core, &app, request(Method::Post, "/api/coupons/validate", Some("{}".to_string())));

        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_numeric_coupon_code_is_bad_request() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());

        for path in &["/api/coupons/validate", "/api/coupons/use"] {
            let body = json!({ "coupon_code": 123 }).to_string();
            let (status, reply) = respond(&mut core, &app, request(Method::Post, path, Some(body)));

            assert_eq!(status, StatusCode::BadRequest);
            assert_eq!(reply["code"], 400);
            assert_eq!(reply["message"], "Malformed input: coupon_code must be a non-empty string");
        }
    }

    #[test]
    fn test_admin_payments_date_filter() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());
        let payment = json!({"name": "Jane", "amount": "5,000", "country": "Tanzania"}).to_string();
        let (status, _) = respond(&mut core, &app, request(Method::Post, "/api/payments", Some(payment)));
        assert_eq!(status, StatusCode::Ok);

        let (status, all) = respond(&mut core, &app, request(Method::Get, "/api/admin/payments", None));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(all[0]["amount"], "5000");

        let (status, none) = respond(&mut core, &app, request(Method::Get, "/api/admin/payments?end_date=2000-01-01", None));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(none, json!([]));

        let (status, dashboard) = respond(&mut core, &app, request(Method::Get, "/api/admin/dashboard", None));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(dashboard["revenue_by_country"]["Tanzania"], 5000.0);
    }

    #[test]
    fn test_admin_payments_with_bad_date_is_bad_request() {
        let mut core = Core::new().unwrap();
        let app = Application::new(create_controller());

        let (status, body) = respond(&mut core, &app, request(Method::Get, "/api/admin/payments?start_date=yesterday", None));

        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(body["message"], "Malformed input: Invalid start_date: yesterday");
    }

    #[test]
    fn test_untyped_errors_are_internal() {
        let reply = error_reply(&format_err!("sheet exploded"));
        assert_eq!(reply.status, StatusCode::InternalServerError);
        assert!(!reply.body.contains("exploded"));
    }
}
