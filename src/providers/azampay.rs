//! AzamPay mobile-money checkout over blocking HTTP
use std::time::Duration;

use failure::Error as FailureError;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use config::AzamPay;
use errors::Error;
use models::{CheckoutReceipt, MobileCheckoutRequest, PaymentStatus};
use providers::PaymentGateway;

pub const TOKEN_PATH: &str = "/AppRegistration/GenerateToken";
pub const CHECKOUT_PATH: &str = "/azampay/api/v1/payments/mno/checkout";
pub const STATUS_PATH: &str = "/azampay/api/v1/payments/status";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    app_name: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MnoCheckoutBody {
    pub account_number: String,
    pub amount: f64,
    pub currency: String,
    pub external_id: String,
    pub provider: String,
    pub additional_properties: Value,
    pub callback_url: String,
}

pub struct AzamPayClient {
    client: Client,
    config: AzamPay,
}

impl AzamPayClient {
    pub fn new(config: AzamPay) -> Result<Self, FailureError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_s)).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_right_matches('/'), path)
    }

    fn status_url(&self, transaction_id: &str) -> String {
        format!("{}/{}", self.url(STATUS_PATH), transaction_id)
    }

    pub fn checkout_body(&self, request: &MobileCheckoutRequest) -> MnoCheckoutBody {
        MnoCheckoutBody {
            account_number: request.account_number.clone(),
            amount: request.amount,
            currency: self.config.currency.clone(),
            external_id: request.external_id.clone(),
            provider: request.provider.to_string(),
            additional_properties: json!({"property1": null, "property2": null}),
            callback_url: self.config.callback_url.clone(),
        }
    }

    fn token(&self) -> Result<String, FailureError> {
        debug!("Requesting AzamPay token for app {}.", self.config.app_name);
        let body = TokenRequest {
            app_name: &self.config.app_name,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };
        let mut response = self.client.post(&self.url(TOKEN_PATH)).json(&body).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            error!("AzamPay token request failed with {}: {}", status, response_text(&mut response));
            return Err(Error::PaymentGateway("Authentication failed".to_string()).into());
        }
        let value: Value = response.json()?;
        value["data"]["accessToken"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::PaymentGateway("Authentication failed: no access token".to_string()).into())
    }
}

fn response_text(response: &mut Response) -> String {
    response.text().unwrap_or_default()
}

impl PaymentGateway for AzamPayClient {
    fn checkout(&self, request: &MobileCheckoutRequest) -> Result<CheckoutReceipt, FailureError> {
        info!(
            "AzamPay checkout {} of {} via {}.",
            request.external_id, request.amount, request.provider
        );
        let token = self.token()?;
        let mut response = self
            .client
            .post(&self.url(CHECKOUT_PATH))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&self.checkout_body(request))
            .send()?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                let body: Value = response.json().unwrap_or(Value::Null);
                let reference = body["transactionId"]
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| request.external_id.clone());
                info!("AzamPay accepted checkout {}, reference {}.", request.external_id, reference);
                Ok(CheckoutReceipt {
                    transaction_id: request.external_id.clone(),
                    reference,
                    response: body,
                })
            }
            status => {
                let text = response_text(&mut response);
                error!("AzamPay rejected checkout {} with {}: {}", request.external_id, status, text);
                Err(Error::PaymentGateway(format!("Payment request failed: {}", text)).into())
            }
        }
    }

    fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus, FailureError> {
        debug!("Verifying AzamPay transaction {}.", transaction_id);
        let token = self.token()?;
        let mut response = self
            .client
            .get(&self.status_url(transaction_id))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response_text(&mut response);
            error!("AzamPay status of {} failed with {}: {}", transaction_id, status, text);
            return Err(Error::PaymentGateway(format!("Verification failed: {}", text)).into());
        }
        let data: Value = response.json()?;
        Ok(PaymentStatus {
            success: true,
            transaction_id: transaction_id.to_string(),
            status: data["status"].as_str().unwrap_or("UNKNOWN").to_string(),
            data,
        })
    }
}
