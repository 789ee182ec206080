//! Pizza factory client.
//!
//! The factory bakes an order and answers with a signed receipt (`jwt`) and a
//! `reportUrl` describing the outcome. Failures carry a `reportUrl` too.

use std::time::Duration;

use pizza_core::{Email, UserId};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FactoryConfig;
use crate::models::{Order, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the pizza factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Transport or decoding failure.
    #[error("factory request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The factory refused the order.
    #[error("factory rejected order with status {status}")]
    Rejected {
        status: u16,
        report_url: Option<String>,
    },
}

impl FactoryError {
    /// Link to the factory's report on the failure, if it sent one.
    #[must_use]
    pub fn report_url(&self) -> Option<&str> {
        match self {
            Self::Http(_) => None,
            Self::Rejected { report_url, .. } => report_url.as_deref(),
        }
    }
}

/// A successfully fulfilled order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryReceipt {
    pub jwt: String,
    pub report_url: Option<String>,
}

#[derive(Serialize)]
struct Diner<'a> {
    id: UserId,
    name: &'a str,
    email: &'a Email,
}

#[derive(Serialize)]
struct FulfillRequest<'a> {
    diner: Diner<'a>,
    order: &'a Order,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody {
    report_url: Option<String>,
}

/// Client for the pizza factory API.
#[derive(Clone)]
pub struct FactoryClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl FactoryClient {
    /// Create a new factory client.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Http` if the HTTP client cannot be built.
    pub fn new(config: &FactoryConfig) -> Result<Self, FactoryError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send an order to the factory.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Rejected` for a non-success status and
    /// `FactoryError::Http` if the request fails.
    #[tracing::instrument(skip(self, diner, order), fields(order_id = %order.id))]
    pub async fn fulfill(&self, diner: &User, order: &Order) -> Result<FactoryReceipt, FactoryError> {
        let body = FulfillRequest {
            diner: Diner {
                id: diner.id,
                name: &diner.name,
                email: &diner.email,
            },
            order,
        };

        let response = self
            .client
            .post(format!("{}/api/order", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let report_url = response
                .json::<FailureBody>()
                .await
                .ok()
                .and_then(|body| body.report_url);
            tracing::warn!(status = status.as_u16(), "Factory rejected order");
            return Err(FactoryError::Rejected {
                status: status.as_u16(),
                report_url,
            });
        }

        Ok(response.json::<FactoryReceipt>().await?)
    }
}
