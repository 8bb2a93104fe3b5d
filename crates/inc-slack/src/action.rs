//! Decoding of interactive callback bodies.
//!
//! Callbacks arrive as `application/x-www-form-urlencoded` with a single
//! `payload` field holding the JSON interaction.

use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::GatewayError;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MessageTs {
    pub ts: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Container {
    #[serde(default)]
    pub message_ts: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// The subset of a `block_actions` interaction the gateway reads.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ActionPayload {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub user: Option<IdRef>,
    #[serde(default)]
    pub channel: Option<IdRef>,
    #[serde(default)]
    pub message: Option<MessageTs>,
    #[serde(default)]
    pub container: Option<Container>,
}

impl ActionPayload {
    #[must_use]
    pub fn first_action(&self) -> Option<&Action> {
        self.actions.first()
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user.as_ref().map_or("unknown", |u| u.id.as_str())
    }

    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or_else(|| self.container.as_ref()?.channel_id.as_deref())
    }

    /// Timestamp of the message the buttons were on; replies thread under it.
    #[must_use]
    pub fn thread_ts(&self) -> Option<&str> {
        self.message
            .as_ref()
            .map(|m| m.ts.as_str())
            .or_else(|| self.container.as_ref()?.message_ts.as_deref())
    }
}

/// What a decision button carried.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonValue {
    pub approval_id: Option<String>,
    pub alert: Value,
}

impl ButtonValue {
    /// Parse `{approval_id, alert}`; a bare alert object is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Payload`] if the value is not a JSON object.
    pub fn parse(raw: Option<&str>) -> Result<Self, GatewayError> {
        let Some(raw) = raw else {
            return Ok(Self {
                approval_id: None,
                alert: Value::Object(serde_json::Map::new()),
            });
        };
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| GatewayError::payload(format!("button value is not JSON: {e}")))?;
        let Value::Object(mut obj) = value else {
            return Err(GatewayError::payload("button value must be a JSON object"));
        };
        if obj.contains_key("alert") {
            let approval_id = obj
                .remove("approval_id")
                .and_then(|v| v.as_str().map(str::to_string));
            let alert = obj.remove("alert").unwrap_or(Value::Null);
            Ok(Self { approval_id, alert })
        } else {
            Ok(Self {
                approval_id: None,
                alert: Value::Object(obj),
            })
        }
    }

    #[must_use]
    pub fn alert_id(&self) -> &str {
        self.alert
            .get("alert_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}

/// Extract and parse the `payload` field of a form-encoded body.
///
/// # Errors
///
/// Returns [`GatewayError::Payload`] if the field is missing or is not a
/// JSON interaction.
pub fn parse_form_payload(body: &[u8]) -> Result<ActionPayload, GatewayError> {
    let payload = form_urlencoded::parse(body)
        .find_map(|(key, value)| (key == "payload").then_some(value))
        .ok_or_else(|| GatewayError::payload("missing payload field"))?;
    serde_json::from_str(&payload)
        .map_err(|e| GatewayError::payload(format!("payload is not a JSON interaction: {e}")))
}

/// Form-encode a JSON interaction as the `payload` field.
#[must_use]
pub fn encode_form_payload(payload: &Value) -> Vec<u8> {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", &payload.to_string())
        .finish()
        .into_bytes()
}
