use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::backend::errors::BackendError;
use crate::backend::types::{
    ErrorDetail, ExternalPoRef, FeesPayload, NewPurchaseOrder, PurchaseOrder, ResponseMsg,
    StatusOverride,
};

/// Backend operations consumed by the workflow core.
///
/// One method per endpoint of the purchase-order API. Test suites substitute
/// this trait; production uses [`HttpBackend`].
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn fetch_purchase_orders(&self) -> Result<Vec<PurchaseOrder>, BackendError>;

    /// Fire-and-forget from the client's perspective: the created PO shows up
    /// on a later refresh.
    async fn create_purchase_order(&self, po: &NewPurchaseOrder) -> Result<(), BackendError>;

    async fn delete_purchase_order(&self, id: u64) -> Result<ResponseMsg, BackendError>;

    async fn create_breakdown(&self, id: u64) -> Result<ResponseMsg, BackendError>;

    async fn calculate_net_sales(
        &self,
        id: u64,
        fees: &FeesPayload,
    ) -> Result<ResponseMsg, BackendError>;

    async fn create_skus_and_po_ats(&self, id: u64) -> Result<ResponseMsg, BackendError>;

    async fn create_skus_and_po_non_ats(
        &self,
        id: u64,
        po_ref: &ExternalPoRef,
    ) -> Result<ResponseMsg, BackendError>;

    /// The backend computes the reverse target from the PO's current status;
    /// the client sends only the id.
    async fn undo_status(&self, id: u64) -> Result<ResponseMsg, BackendError>;

    /// Developer-only escape hatch. Clears `spreadsheet_id` as part of the
    /// payload.
    async fn override_status(
        &self,
        id: u64,
        update: &StatusOverride,
    ) -> Result<ResponseMsg, BackendError>;
}

/// Reqwest-backed implementation of [`BackendApi`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%method, %url, "sending backend request");
        self.http.request(method, url)
    }

    /// Issues the request and decodes the JSON body. Non-2xx responses are
    /// decoded to their `{detail}` text, falling back to the HTTP status line
    /// when the body is not the expected shape.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let detail = match response.json::<ErrorDetail>().await {
            Ok(body) => body.detail,
            Err(_) => status.to_string(),
        };
        Err(BackendError::Rejected { status, detail })
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_purchase_orders(&self) -> Result<Vec<PurchaseOrder>, BackendError> {
        self.send(self.request(Method::GET, "purchase-orders")).await
    }

    async fn create_purchase_order(&self, po: &NewPurchaseOrder) -> Result<(), BackendError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "purchase-orders").json(po))
            .await
            .map(|_| ())
    }

    async fn delete_purchase_order(&self, id: u64) -> Result<ResponseMsg, BackendError> {
        self.send(self.request(Method::DELETE, &format!("purchase-orders/{id}")))
            .await
    }

    async fn create_breakdown(&self, id: u64) -> Result<ResponseMsg, BackendError> {
        self.send(self.request(Method::POST, &format!("purchase-orders/{id}/create-breakdown")))
            .await
    }

    async fn calculate_net_sales(
        &self,
        id: u64,
        fees: &FeesPayload,
    ) -> Result<ResponseMsg, BackendError> {
        self.send(
            self.request(
                Method::POST,
                &format!("purchase-orders/{id}/calculate-net-sales"),
            )
            .json(fees),
        )
        .await
    }

    async fn create_skus_and_po_ats(&self, id: u64) -> Result<ResponseMsg, BackendError> {
        self.send(self.request(
            Method::POST,
            &format!("purchase-orders/{id}/create-skus-and-po-ats"),
        ))
        .await
    }

    async fn create_skus_and_po_non_ats(
        &self,
        id: u64,
        po_ref: &ExternalPoRef,
    ) -> Result<ResponseMsg, BackendError> {
        self.send(
            self.request(
                Method::POST,
                &format!("purchase-orders/{id}/create-skus-and-po-non-ats"),
            )
            .json(po_ref),
        )
        .await
    }

    async fn undo_status(&self, id: u64) -> Result<ResponseMsg, BackendError> {
        self.send(self.request(Method::PUT, &format!("purchase-orders/{id}/undo-status")))
            .await
    }

    async fn override_status(
        &self,
        id: u64,
        update: &StatusOverride,
    ) -> Result<ResponseMsg, BackendError> {
        self.send(
            self.request(Method::PUT, &format!("purchase-orders/{id}"))
                .json(update),
        )
        .await
    }
}
