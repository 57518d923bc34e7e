//! RevenueCat webhook event mapping.
//!
//! Event-to-mutation plumbing, kept apart from the HTTP handler so the
//! mapping is testable without a router: purchase events append a log entry
//! and grant coin bundles or the ads entitlement; refunds revoke it; every
//! other event type is ignored.

use anyhow::Context;
use chrono::{DateTime, Utc};
use reef_db::{GameStore, StoreError};
use reef_schemas::PurchaseRecord;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Coin credit per bundle product, bonus included.
pub fn coin_bundle(product_id: &str) -> Option<i64> {
    match product_id {
        "coins_100" => Some(100),
        "coins_500" => Some(550),   // 500 + 50 bonus
        "coins_1000" => Some(1200), // 1000 + 200 bonus
        _ => None,
    }
}

const REMOVE_ADS_PRODUCT: &str = "remove_ads";

/// Top-level webhook payload. Every field is optional on the wire; unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: WebhookEvent,
    #[serde(default)]
    pub app_user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Originating store, e.g. "APP_STORE" | "PLAY_STORE".
    #[serde(default)]
    pub store: Option<String>,
}

/// Decode and apply one webhook delivery. Errors are for the caller to log;
/// the HTTP response is `{"status":"ok"}` no matter what.
pub async fn process(
    store: &dyn GameStore,
    payload: serde_json::Value,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let payload: WebhookPayload =
        serde_json::from_value(payload).context("malformed webhook payload")?;
    apply_event(store, payload, now).await
}

async fn apply_event(
    store: &dyn GameStore,
    payload: WebhookPayload,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let event_type = payload.event.event_type.as_deref().unwrap_or("");
    info!(
        event_type,
        app_user_id = payload.app_user_id.as_deref().unwrap_or("<missing>"),
        "revenuecat webhook"
    );

    match event_type {
        "INITIAL_PURCHASE" | "RENEWAL" | "PRODUCT_CHANGE" => {
            let user_id = payload
                .app_user_id
                .context("purchase event missing app_user_id")?;
            let product_id = payload.event.product_id.unwrap_or_default();

            store
                .insert_purchase(&PurchaseRecord {
                    id: Uuid::new_v4(),
                    user_id: user_id.clone(),
                    product_id: product_id.clone(),
                    transaction_id: payload.event.transaction_id.unwrap_or_default(),
                    platform: payload
                        .event
                        .store
                        .unwrap_or_else(|| "unknown".to_string()),
                    event_type: Some(event_type.to_string()),
                    amount: None,
                    currency: None,
                    created_at: now,
                })
                .await?;

            if let Some(credit) = coin_bundle(&product_id) {
                match store.increment_coins(&user_id, credit, now).await {
                    Ok(_) => {}
                    // A bundle bought before the first sync has nowhere to
                    // land; drop it rather than fail the delivery.
                    Err(StoreError::NotFound) => {
                        warn!(user_id = %user_id, product_id = %product_id,
                              "coin bundle for player with no progress record");
                    }
                    Err(err) => return Err(err.into()),
                }
            } else if product_id == REMOVE_ADS_PRODUCT {
                store.set_ads_removed(&user_id, true, now).await?;
            }
        }

        "REFUND" => {
            // The designated reversal event for the sticky ads flag.
            if payload.event.product_id.as_deref() == Some(REMOVE_ADS_PRODUCT) {
                let user_id = payload
                    .app_user_id
                    .context("refund event missing app_user_id")?;
                store.set_ads_removed(&user_id, false, now).await?;
            }
        }

        "CANCELLATION" => {}

        _ => {}
    }

    Ok(())
}
