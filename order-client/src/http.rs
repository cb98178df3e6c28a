//! HTTP client for the order server
//!
//! Reads come back in the `ApiResponse` envelope; commands come back as
//! `CommandResponse` and a rejected command becomes [`ClientError::Command`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use shared::error::ApiResponse;
use shared::order::{
    CommandResponse, CreateOrderRequest, Order, OrderStatus, OrderTracking, PreviewOrderRequest,
    PreviewResponse, PricingPreview, UpdateStatusRequest,
};

use crate::feed::OrderSource;
use crate::{ClientError, ClientResult};

const RESTAURANT_HEADER: &str = "x-restaurant-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which server window a feed mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// Recent orders of the restaurant
    Dashboard,
    /// Open orders plus the recently completed tail
    Kitchen,
}

/// Server-confirmed result of a status command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// `updated_at` of the written row; absent from older servers
    pub updated_at: Option<i64>,
}

/// Order server HTTP client
///
/// Staff calls are scoped to the restaurant set with [`OrderApi::with_restaurant`].
#[derive(Debug, Clone)]
pub struct OrderApi {
    client: Client,
    base_url: String,
    restaurant_id: Option<String>,
}

impl OrderApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            restaurant_id: None,
        })
    }

    pub fn with_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn scoped(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.restaurant_id {
            Some(id) => req.header(RESTAURANT_HEADER, id),
            None => req,
        }
    }

    async fn read<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            ClientError::InvalidResponse(format!("HTTP {status}: {e}"))
        })?;
        match (envelope.code, envelope.data) {
            (Some(0) | None, Some(data)) => Ok(data),
            (Some(0) | None, None) => Err(ClientError::InvalidResponse(
                "missing data in success response".into(),
            )),
            (Some(code), _) => Err(ClientError::Api {
                code,
                message: envelope.message,
            }),
        }
    }

    async fn command(&self, req: RequestBuilder) -> ClientResult<CommandResponse> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let reply: CommandResponse = serde_json::from_str(&text).map_err(|e| {
            ClientError::InvalidResponse(format!("HTTP {status}: {e}"))
        })?;
        if reply.success {
            return Ok(reply);
        }
        Err(match reply.error {
            Some(error) => error.into(),
            None => ClientError::InvalidResponse(format!("HTTP {status}: command failed")),
        })
    }

    // ========== Customer ==========

    /// Place an order; returns the new order id
    pub async fn create_order(&self, req: &CreateOrderRequest) -> ClientResult<String> {
        let reply = self
            .command(self.client.post(self.url("api/orders")).json(req))
            .await?;
        reply
            .order_id
            .ok_or_else(|| ClientError::InvalidResponse("missing order_id".into()))
    }

    /// Authoritative totals for a cart
    pub async fn preview(&self, req: &PreviewOrderRequest) -> ClientResult<PricingPreview> {
        let response = self
            .client
            .post(self.url("api/orders/preview"))
            .json(req)
            .send()
            .await?;
        let text = response.text().await?;
        let reply: PreviewResponse = serde_json::from_str(&text)?;
        match (reply.success, reply.pricing, reply.error) {
            (true, Some(pricing), _) => Ok(pricing),
            (_, _, Some(error)) => Err(error.into()),
            _ => Err(ClientError::InvalidResponse("malformed preview".into())),
        }
    }

    pub async fn track(&self, order_id: &str) -> ClientResult<OrderTracking> {
        self.read(self.client.get(self.url(&format!("api/orders/{order_id}/track"))))
            .await
    }

    // ========== Staff ==========

    pub async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<StatusChange> {
        let req = self
            .client
            .patch(self.url(&format!("api/orders/{order_id}/status")))
            .json(&UpdateStatusRequest { status });
        let reply = self.command(self.scoped(req)).await?;
        Ok(StatusChange {
            status: reply.status.unwrap_or(status),
            updated_at: reply.updated_at,
        })
    }

    pub async fn cancel(&self, order_id: &str) -> ClientResult<StatusChange> {
        let req = self
            .client
            .post(self.url(&format!("api/orders/{order_id}/cancel")));
        let reply = self.command(self.scoped(req)).await?;
        Ok(StatusChange {
            status: reply.status.unwrap_or(OrderStatus::Cancelled),
            updated_at: reply.updated_at,
        })
    }

    pub async fn fetch_recent(
        &self,
        status: Option<OrderStatus>,
        limit: Option<usize>,
    ) -> ClientResult<Vec<Order>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let req = self.client.get(self.url("api/orders")).query(&query);
        self.read(self.scoped(req)).await
    }

    pub async fn fetch_kitchen(&self) -> ClientResult<Vec<Order>> {
        let req = self.client.get(self.url("api/kitchen/orders"));
        self.read(self.scoped(req)).await
    }

    pub async fn fetch_order(&self, order_id: &str) -> ClientResult<Order> {
        let req = self.client.get(self.url(&format!("api/orders/{order_id}")));
        self.read(self.scoped(req)).await
    }

    /// WebSocket URL of the restaurant's live feed
    pub fn live_url(&self) -> ClientResult<String> {
        let restaurant_id = self
            .restaurant_id
            .as_deref()
            .ok_or_else(|| ClientError::InvalidUrl("restaurant id not set".into()))?;
        let mut url =
            Url::parse(&self.url("api/live/ws")).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(format!("cannot use {scheme} for {url}")))?;
        url.query_pairs_mut()
            .append_pair("restaurant_id", restaurant_id);
        Ok(url.to_string())
    }

    /// Window source for a [`crate::LiveFeed`]
    pub fn source(&self, kind: FeedKind) -> ApiOrderSource {
        ApiOrderSource {
            api: self.clone(),
            kind,
        }
    }
}

/// Status commands used by optimistic board updates
#[async_trait]
pub trait OrderCommands: Send + Sync {
    async fn update_status(&self, order_id: &str, status: OrderStatus)
    -> ClientResult<StatusChange>;
    async fn cancel(&self, order_id: &str) -> ClientResult<StatusChange>;
}

#[async_trait]
impl OrderCommands for OrderApi {
    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<StatusChange> {
        OrderApi::update_status(self, order_id, status).await
    }

    async fn cancel(&self, order_id: &str) -> ClientResult<StatusChange> {
        OrderApi::cancel(self, order_id).await
    }
}

/// [`OrderSource`] backed by the HTTP API
#[derive(Debug, Clone)]
pub struct ApiOrderSource {
    api: OrderApi,
    kind: FeedKind,
}

#[async_trait]
impl OrderSource for ApiOrderSource {
    async fn fetch_window(&self) -> ClientResult<Vec<Order>> {
        match self.kind {
            FeedKind::Dashboard => self.api.fetch_recent(None, None).await,
            FeedKind::Kitchen => self.api.fetch_kitchen().await,
        }
    }

    async fn fetch_order(&self, order_id: &str) -> ClientResult<Order> {
        self.api.fetch_order(order_id).await
    }
}
