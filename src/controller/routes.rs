use percent_encoding::percent_decode;
use regex::Regex;

/// List of all routes with params for the app
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Health,
    Bookings,
    Payments,
    AzamPayCheckout,
    AzamPayCallback,
    AzamPayStatus(String),
    Subscriptions,
    Coupons,
    CouponsValidate,
    CouponsUse,
    CouponsForPhone(String),
    AdminDashboard,
    AdminPayments,
    AdminSubscriptions,
}

type ParamsConverter<T> = Box<Fn(Vec<&str>) -> Option<T> + Send + Sync>;

/// Matches request paths against an ordered table of regexes
pub struct RouteParser<T> {
    regex_and_converters: Vec<(Regex, ParamsConverter<T>)>,
}

impl<T> Default for RouteParser<T> {
    fn default() -> Self {
        Self {
            regex_and_converters: Vec::new(),
        }
    }
}

impl<T> RouteParser<T> {
    /// Adds a route without params
    pub fn add_route<F>(&mut self, regex_pattern: &str, f: F) -> &Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.add_route_with_params(regex_pattern, move |_| Some(f()))
    }

    /// Adds a route whose capture groups are handed to the converter
    pub fn add_route_with_params<F>(&mut self, regex_pattern: &str, converter: F) -> &Self
    where
        F: Fn(Vec<&str>) -> Option<T> + Send + Sync + 'static,
    {
        match Regex::new(regex_pattern) {
            Ok(regex) => {
                let converter: ParamsConverter<T> = Box::new(converter);
                self.regex_and_converters.push((regex, converter));
            }
            Err(e) => error!("Route {} is skipped, invalid regex: {}", regex_pattern, e),
        }
        self
    }

    /// First route matching the path, if any
    pub fn test(&self, route: &str) -> Option<T> {
        self.regex_and_converters.iter().fold(None, |acc, &(ref regex, ref converter)| {
            if acc.is_some() {
                return acc;
            }
            regex.captures(route).and_then(|captures| {
                let params = captures.iter().skip(1).filter_map(|m| m.map(|m| m.as_str())).collect::<Vec<_>>();
                converter(params)
            })
        })
    }
}

pub fn create_route_parser() -> RouteParser<Route> {
    let mut router = RouteParser::default();

    router.add_route(r"^/api/health$", || Route::Health);

    router.add_route(r"^/api/bookings$", || Route::Bookings);

    // Payments
    router.add_route(r"^/api/payments$", || Route::Payments);
    router.add_route(r"^/api/payments/azampay/checkout$", || Route::AzamPayCheckout);
    router.add_route(r"^/api/payments/azampay/callback$", || Route::AzamPayCallback);
    router.add_route_with_params(r"^/api/payments/azampay/status/([^/]+)$", |params| {
        params.get(0).map(|transaction_id| Route::AzamPayStatus(transaction_id.to_string()))
    });

    router.add_route(r"^/api/subscriptions$", || Route::Subscriptions);

    // Coupons
    router.add_route(r"^/api/coupons$", || Route::Coupons);
    router.add_route(r"^/api/coupons/validate$", || Route::CouponsValidate);
    router.add_route(r"^/api/coupons/use$", || Route::CouponsUse);
    router.add_route_with_params(r"^/api/coupons/user/([^/]+)$", |params| {
        params.get(0).map(|phone| Route::CouponsForPhone(decode_segment(phone)))
    });

    // Admin
    router.add_route(r"^/api/admin/dashboard$", || Route::AdminDashboard);
    router.add_route(r"^/api/admin/payments$", || Route::AdminPayments);
    router.add_route(r"^/api/admin/subscriptions$", || Route::AdminSubscriptions);

    router
}

/// Undoes percent-encoding of a path segment, e.g. `%2B255...` in phone numbers
fn decode_segment(segment: &str) -> String {
    percent_decode(segment.as_bytes()).decode_utf8_lossy().into_owned()
}
