//! Front-door adapter: turns HTTP-style gateway events into coordinator calls
//! and coordinator results into status-coded responses.

use crate::application::coordinator::{Accepted, IngestionCoordinator};
use crate::domain::order::{FIELD_ORDER_ID, OrderId};
use crate::domain::validation::parse_order_id;
use crate::error::{OrderError, Result, SchemaViolation};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

const GROUP_HINT_FIELD: &str = "messageGroupId";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub http_method: String,
    /// Either a JSON object or a string holding one.
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub body: Value,
}

impl GatewayResponse {
    fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    fn from_error(err: &OrderError) -> Self {
        Self {
            status_code: err.status_code(),
            body: json!({ "error": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// The `error` text of a failed response.
    pub fn reason(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Decoded mutation body: `{ "message": {...}, "messageGroupId": "..." }`.
struct MutationBody {
    message: Value,
    group_hint: Option<String>,
}

pub struct Gateway {
    coordinator: Arc<IngestionCoordinator>,
}

impl Gateway {
    pub fn new(coordinator: Arc<IngestionCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Dispatches one request. Never fails: every error becomes a response.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let method = request.http_method.to_ascii_uppercase();
        let result = match method.as_str() {
            "POST" => self.post(&request).await,
            "GET" => self.get(&request).await,
            "PUT" => self.put(&request).await,
            "DELETE" => self.delete(&request).await,
            _ => Err(OrderError::BadRequest("Unsupported HTTP method".to_string())),
        };

        match result {
            Ok(body) => {
                info!(method = %method, "Request accepted");
                GatewayResponse::ok(body)
            }
            Err(e) if e.is_client_fault() => {
                info!(method = %method, error = %e, "Request rejected");
                GatewayResponse::from_error(&e)
            }
            Err(e) => {
                error!(method = %method, error = %e, "Request failed");
                GatewayResponse::from_error(&e)
            }
        }
    }

    async fn post(&self, request: &GatewayRequest) -> Result<Value> {
        let body = mutation_body(request)?;
        let accepted = self
            .coordinator
            .create(&body.message, body.group_hint.as_deref())
            .await?;
        Ok(accepted_body("Order accepted for processing", &accepted))
    }

    async fn get(&self, request: &GatewayRequest) -> Result<Value> {
        let order_id = query_order_id(request)?
            .ok_or_else(|| SchemaViolation::missing(FIELD_ORDER_ID, "Number"))?;
        let stored_data = match self.coordinator.read(order_id).await? {
            Some(item) => serde_json::to_value(item)?,
            None => json!({}),
        };
        Ok(json!({
            "storedData": stored_data,
            "message": "GET request processed successfully",
        }))
    }

    async fn put(&self, request: &GatewayRequest) -> Result<Value> {
        let body = mutation_body(request)?;
        let order_id = match query_order_id(request)? {
            Some(id) => id,
            None => body_order_id(&body.message)?,
        };
        let accepted = self
            .coordinator
            .update(order_id, &body.message, body.group_hint.as_deref())
            .await?;
        Ok(accepted_body("Order update accepted for processing", &accepted))
    }

    async fn delete(&self, request: &GatewayRequest) -> Result<Value> {
        let order_id = query_order_id(request)?
            .ok_or_else(|| SchemaViolation::missing(FIELD_ORDER_ID, "Number"))?;
        let group_hint = query_param(request, GROUP_HINT_FIELD);
        let accepted = self.coordinator.delete(order_id, group_hint).await?;
        Ok(accepted_body(
            "DELETE request received. Processing in progress.",
            &accepted,
        ))
    }
}

fn accepted_body(message: &str, accepted: &Accepted) -> Value {
    json!({
        "message": message,
        "messageId": accepted.message_id.0,
        "duplicate": accepted.duplicate,
    })
}

fn query_param<'a>(request: &'a GatewayRequest, name: &str) -> Option<&'a str> {
    request
        .query_string_parameters
        .as_ref()
        .and_then(|params| params.get(name))
        .map(String::as_str)
}

fn query_order_id(request: &GatewayRequest) -> Result<Option<OrderId>> {
    query_param(request, FIELD_ORDER_ID)
        .map(parse_order_id)
        .transpose()
}

fn body_order_id(message: &Value) -> Result<OrderId> {
    match message.get(FIELD_ORDER_ID) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| SchemaViolation::wrong_type(FIELD_ORDER_ID, "Number").into()),
        Some(_) => Err(SchemaViolation::wrong_type(FIELD_ORDER_ID, "Number").into()),
        None => Err(SchemaViolation::missing(FIELD_ORDER_ID, "Number").into()),
    }
}

fn mutation_body(request: &GatewayRequest) -> Result<MutationBody> {
    let raw = request
        .body
        .as_ref()
        .ok_or_else(|| OrderError::BadRequest("Request body is required".to_string()))?;

    let decoded = match raw {
        Value::String(text) => serde_json::from_str::<Value>(text).map_err(|_| {
            OrderError::BadRequest("Error decoding JSON from the event body.".to_string())
        })?,
        other => other.clone(),
    };

    let Value::Object(mut fields) = decoded else {
        return Err(OrderError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let message = fields
        .remove("message")
        .ok_or_else(|| OrderError::BadRequest("Request body has no 'message'".to_string()))?;
    let group_hint = match fields.remove(GROUP_HINT_FIELD) {
        Some(Value::String(hint)) => Some(hint),
        Some(Value::Null) | None => None,
        Some(_) => return Err(SchemaViolation::wrong_type(GROUP_HINT_FIELD, "string").into()),
    };

    Ok(MutationBody {
        message,
        group_hint,
    })
}
