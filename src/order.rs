//! Order payloads exchanged with the replicas and returned to clients.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::routing::Replica;

/// An order as served by a replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub order_id: i64,
    pub status: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// An order decorated with the routing decision that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedOrder {
    #[serde(flatten)]
    pub order: OrderPayload,
    pub routed_to: Replica,
    pub route_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
