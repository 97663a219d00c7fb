//! Govee OpenAPI client — transport trait + blocking reqwest backend.
//!
//! Both actions funnel their remote calls through [`DeviceControl`], which
//! takes a capability descriptor and returns a tagged result. The HTTP layer
//! sits behind [`Transport`] so response interpretation can be tested with
//! [`mock::MockTransport`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::settings::Power;

/// <https://developer.govee.com/reference/control-you-devices>
pub const DEFAULT_BASE_URL: &str = "https://openapi.api.govee.com/router/api/v1";

/// Per-request timeout. A timeout is reported like any other transport failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_KEY_HEADER: &str = "Govee-API-Key";

pub const POWER_TYPE: &str = "devices.capabilities.on_off";
pub const POWER_INSTANCE: &str = "powerSwitch";
pub const BRIGHTNESS_TYPE: &str = "devices.capabilities.range";
pub const BRIGHTNESS_INSTANCE: &str = "brightness";

// ── Error type ──

/// Remote call failures.
#[derive(Debug)]
pub enum ApiError {
    /// Network error or timeout; the request may not have reached the server.
    Transport(String),
    /// Non-200 HTTP status, with the raw response body.
    Status { status: u16, body: String },
    /// Body was not the JSON shape the call requires.
    Malformed(String),
    /// HTTP 200 but the body carried a non-success `code`.
    Application { code: Value, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "Request failed: {e}"),
            ApiError::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            ApiError::Malformed(e) => write!(f, "Malformed response: {e}"),
            ApiError::Application { code, message } => write!(f, "API error {code}: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

pub type Result<T> = std::result::Result<T, ApiError>;

// ── Request model ──

/// A controllable device feature and the value to set it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub instance: &'static str,
    pub value: i64,
}

impl Capability {
    pub fn power(power: Power) -> Self {
        Capability {
            kind: POWER_TYPE,
            instance: POWER_INSTANCE,
            value: if power.is_on() { 1 } else { 0 },
        }
    }

    pub fn brightness(value: u8) -> Self {
        Capability {
            kind: BRIGHTNESS_TYPE,
            instance: BRIGHTNESS_INSTANCE,
            value: value.into(),
        }
    }
}

/// Credentials and identifiers addressing one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTarget<'a> {
    pub api_key: &'a str,
    pub device: &'a str,
    pub sku: &'a str,
}

#[derive(Serialize, Debug)]
struct ControlRequest<'a> {
    #[serde(rename = "requestId")]
    request_id: String,
    payload: ControlPayload<'a>,
}

#[derive(Serialize, Debug)]
struct ControlPayload<'a> {
    sku: &'a str,
    device: &'a str,
    capability: &'a Capability,
}

/// Control request body with a fresh random request id.
pub fn control_body(target: &DeviceTarget<'_>, capability: &Capability) -> Value {
    let request = ControlRequest {
        request_id: uuid::Uuid::new_v4().simple().to_string(),
        payload: ControlPayload {
            sku: target.sku,
            device: target.device,
            capability,
        },
    };
    // Plain strings and integers only; serialization cannot fail.
    serde_json::to_value(request).unwrap_or_else(|_| json!({}))
}

// ── Device list model ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapability {
    #[serde(rename = "type")]
    pub kind: String,
    pub instance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub sku: String,
    pub device: String,
    #[serde(default, rename = "deviceName")]
    pub device_name: String,
    #[serde(default, rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub capabilities: Vec<DeviceCapability>,
}

impl DeviceInfo {
    /// Whether the device advertises a brightness range capability.
    pub fn supports_brightness(&self) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.kind == BRIGHTNESS_TYPE && c.instance == BRIGHTNESS_INSTANCE)
    }
}

#[derive(Deserialize, Debug)]
struct DeviceListResponse {
    #[serde(default)]
    data: Vec<DeviceInfo>,
}

// ── Transport ──

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Any status below 400.
    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

/// Minimal HTTP surface the client needs.
pub trait Transport {
    fn get(&self, url: &str, api_key: &str) -> Result<HttpResponse>;
    fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse>;
}

/// Blocking reqwest backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("govee-deck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(format!("client build: {e}")))?;
        Ok(HttpTransport { client })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(format!("read body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, api_key: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::finish(response)
    }

    fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::finish(response)
    }
}

// ── Response interpretation ──

/// `code` absent, `null`, `200` or `0` counts as success.
fn check_code(body: &Value) -> Result<()> {
    let Some(code) = body.get("code") else {
        return Ok(());
    };
    let ok = match code {
        Value::Null => true,
        Value::Number(n) => matches!(n.as_f64(), Some(c) if c == 200.0 || c == 0.0),
        _ => false,
    };
    if ok {
        return Ok(());
    }
    let message = body
        .get("message")
        .or_else(|| body.get("msg"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(ApiError::Application {
        code: code.clone(),
        message,
    })
}

/// Interpret a control response. A 200 with a non-JSON body is a success.
pub fn interpret_control_response(response: &HttpResponse) -> Result<()> {
    if response.status != 200 {
        return Err(ApiError::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }
    match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => check_code(&body),
        Err(_) => Ok(()),
    }
}

/// Parse a device list response. Unlike control, the body must be JSON.
pub fn parse_device_list(response: &HttpResponse) -> Result<Vec<DeviceInfo>> {
    if response.status != 200 {
        return Err(ApiError::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }
    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Malformed(format!("{e}: {}", response.body)))?;
    check_code(&body)?;
    let list: DeviceListResponse =
        serde_json::from_value(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
    Ok(list.data)
}

// ── Client ──

/// Sets one capability on one device. The seam actions depend on.
pub trait DeviceControl {
    fn set_capability(&self, target: &DeviceTarget<'_>, capability: &Capability) -> Result<()>;
}

pub struct GoveeClient<T> {
    transport: T,
    base_url: String,
}

impl GoveeClient<HttpTransport> {
    /// Client over the blocking HTTP backend.
    pub fn http(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(timeout)?, base_url))
    }
}

impl<T: Transport> GoveeClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        GoveeClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /device/control`, returning the raw exchange.
    pub fn control_raw(
        &self,
        target: &DeviceTarget<'_>,
        capability: &Capability,
    ) -> Result<HttpResponse> {
        let body = control_body(target, capability);
        log::debug!("control request: {body}");
        self.transport
            .post_json(&self.endpoint("/device/control"), target.api_key, &body)
    }

    /// `GET /user/devices`, returning the raw exchange.
    pub fn list_devices_raw(&self, api_key: &str) -> Result<HttpResponse> {
        self.transport.get(&self.endpoint("/user/devices"), api_key)
    }

    pub fn list_devices(&self, api_key: &str) -> Result<Vec<DeviceInfo>> {
        parse_device_list(&self.list_devices_raw(api_key)?)
    }
}

impl<T: Transport> DeviceControl for GoveeClient<T> {
    fn set_capability(&self, target: &DeviceTarget<'_>, capability: &Capability) -> Result<()> {
        let response = self.control_raw(target, capability)?;
        interpret_control_response(&response)
    }
}

impl<C: DeviceControl + ?Sized> DeviceControl for &C {
    fn set_capability(&self, target: &DeviceTarget<'_>, capability: &Capability) -> Result<()> {
        (**self).set_capability(target, capability)
    }
}

/// Scripted transport and control doubles for unit and integration tests.
///
/// Always compiled, hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// One recorded HTTP request.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub url: String,
        pub api_key: String,
        pub body: Option<Value>,
    }

    /// Transport that replays queued responses and records every request.
    /// With an empty queue it answers `200 {"code":200}`.
    #[derive(Default)]
    pub struct MockTransport {
        pub requests: RefCell<Vec<RecordedRequest>>,
        pub responses: RefCell<VecDeque<Result<HttpResponse>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, status: u16, body: &str) {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
        }

        pub fn push_error(&self, error: ApiError) {
            self.responses.borrow_mut().push_back(Err(error));
        }

        fn next(&self) -> Result<HttpResponse> {
            self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 200,
                    body: r#"{"code":200,"msg":"success"}"#.into(),
                })
            })
        }
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str, api_key: &str) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(RecordedRequest {
                method: "GET",
                url: url.to_string(),
                api_key: api_key.to_string(),
                body: None,
            });
            self.next()
        }

        fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(RecordedRequest {
                method: "POST",
                url: url.to_string(),
                api_key: api_key.to_string(),
                body: Some(body.clone()),
            });
            self.next()
        }
    }

    /// One recorded capability call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ControlCall {
        pub api_key: String,
        pub device: String,
        pub sku: String,
        pub capability: Capability,
    }

    /// `DeviceControl` double: records calls, replays queued outcomes,
    /// succeeds when the queue is empty.
    #[derive(Default)]
    pub struct MockControl {
        pub calls: RefCell<Vec<ControlCall>>,
        pub outcomes: RefCell<VecDeque<Result<()>>>,
    }

    impl MockControl {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_failure(&self, error: ApiError) {
            self.outcomes.borrow_mut().push_back(Err(error));
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn last_call(&self) -> Option<ControlCall> {
            self.calls.borrow().last().cloned()
        }
    }

    impl DeviceControl for MockControl {
        fn set_capability(&self, target: &DeviceTarget<'_>, capability: &Capability) -> Result<()> {
            self.calls.borrow_mut().push(ControlCall {
                api_key: target.api_key.to_string(),
                device: target.device.to_string(),
                sku: target.sku.to_string(),
                capability: capability.clone(),
            });
            self.outcomes.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    const TARGET: DeviceTarget<'static> = DeviceTarget {
        api_key: "key-1",
        device: "AA:BB:CC:DD:EE:FF:00:11",
        sku: "H6008",
    };

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    #[test]
    fn capability_power_values() {
        assert_eq!(Capability::power(Power::On).value, 1);
        assert_eq!(Capability::power(Power::Off).value, 0);
        assert_eq!(Capability::power(Power::On).kind, POWER_TYPE);
    }

    #[test]
    fn capability_brightness() {
        let c = Capability::brightness(55);
        assert_eq!(c.kind, BRIGHTNESS_TYPE);
        assert_eq!(c.instance, BRIGHTNESS_INSTANCE);
        assert_eq!(c.value, 55);
    }

    #[test]
    fn control_body_shape() {
        let body = control_body(&TARGET, &Capability::power(Power::On));
        let id = body["requestId"].as_str().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(body["payload"]["sku"], "H6008");
        assert_eq!(body["payload"]["device"], "AA:BB:CC:DD:EE:FF:00:11");
        assert_eq!(body["payload"]["capability"]["type"], POWER_TYPE);
        assert_eq!(body["payload"]["capability"]["instance"], POWER_INSTANCE);
        assert_eq!(body["payload"]["capability"]["value"], 1);
    }

    #[test]
    fn control_request_ids_are_fresh() {
        let a = control_body(&TARGET, &Capability::brightness(10));
        let b = control_body(&TARGET, &Capability::brightness(10));
        assert_ne!(a["requestId"], b["requestId"]);
    }

    #[test]
    fn code_200_is_success() {
        assert!(interpret_control_response(&ok(r#"{"code": 200}"#)).is_ok());
    }

    #[test]
    fn code_0_and_null_and_absent_are_success() {
        assert!(interpret_control_response(&ok(r#"{"code": 0}"#)).is_ok());
        assert!(interpret_control_response(&ok(r#"{"code": null}"#)).is_ok());
        assert!(interpret_control_response(&ok(r#"{"message": "fine"}"#)).is_ok());
    }

    #[test]
    fn non_json_200_is_success() {
        assert!(interpret_control_response(&ok("OK")).is_ok());
    }

    #[test]
    fn application_error_code_is_failure() {
        let err =
            interpret_control_response(&ok(r#"{"code": 2000, "message": "invalid"}"#)).unwrap_err();
        match err {
            ApiError::Application { code, message } => {
                assert_eq!(code, 2000);
                assert_eq!(message, "invalid");
            }
            other => panic!("expected Application, got {other:?}"),
        }
    }

    #[test]
    fn application_error_reads_msg_field() {
        let err = interpret_control_response(&ok(r#"{"code": 400, "msg": "bad sku"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "API error 400: bad sku");
    }

    #[test]
    fn string_code_is_failure() {
        assert!(interpret_control_response(&ok(r#"{"code": "200"}"#)).is_err());
    }

    #[test]
    fn http_500_is_failure_whatever_the_body() {
        let resp = HttpResponse {
            status: 500,
            body: r#"{"code": 200}"#.into(),
        };
        assert!(matches!(
            interpret_control_response(&resp),
            Err(ApiError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn set_capability_posts_to_control_endpoint() {
        let client = GoveeClient::new(MockTransport::new(), "https://example.test/api/");
        client
            .set_capability(&TARGET, &Capability::brightness(40))
            .unwrap();
        let requests = client.transport().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url, "https://example.test/api/device/control");
        assert_eq!(requests[0].api_key, "key-1");
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["payload"]["capability"]["value"], 40);
    }

    #[test]
    fn set_capability_propagates_transport_error() {
        let transport = MockTransport::new();
        transport.push_error(ApiError::Transport("timed out".into()));
        let client = GoveeClient::new(transport, DEFAULT_BASE_URL);
        let err = client
            .set_capability(&TARGET, &Capability::power(Power::Off))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn list_devices_parses_records() {
        let transport = MockTransport::new();
        transport.push_response(
            200,
            r#"{
                "code": 200,
                "message": "success",
                "data": [
                    {
                        "sku": "H6008",
                        "device": "AA:BB",
                        "deviceName": "Desk Lamp",
                        "type": "devices.types.light",
                        "capabilities": [
                            {"type": "devices.capabilities.on_off", "instance": "powerSwitch", "parameters": {}},
                            {"type": "devices.capabilities.range", "instance": "brightness", "parameters": {}}
                        ]
                    },
                    {"sku": "H5080", "device": "CC:DD", "capabilities": []}
                ]
            }"#,
        );
        let client = GoveeClient::new(transport, DEFAULT_BASE_URL);
        let devices = client.list_devices("key-1").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_name, "Desk Lamp");
        assert!(devices[0].supports_brightness());
        assert!(!devices[1].supports_brightness());
        assert_eq!(devices[1].device_name, "");

        let requests = client.transport().requests.borrow();
        assert_eq!(requests[0].method, "GET");
        assert!(requests[0].url.ends_with("/user/devices"));
    }

    #[test]
    fn list_devices_rejects_non_json() {
        let transport = MockTransport::new();
        transport.push_response(200, "<html>");
        let client = GoveeClient::new(transport, DEFAULT_BASE_URL);
        assert!(matches!(
            client.list_devices("k"),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn list_devices_rejects_error_code() {
        let transport = MockTransport::new();
        transport.push_response(200, r#"{"code": 401, "message": "unauthorized"}"#);
        let client = GoveeClient::new(transport, DEFAULT_BASE_URL);
        assert!(matches!(
            client.list_devices("k"),
            Err(ApiError::Application { .. })
        ));
    }

    #[test]
    fn http_response_is_ok_below_400() {
        assert!(ok("").is_ok());
        assert!(
            !HttpResponse {
                status: 404,
                body: String::new()
            }
            .is_ok()
        );
    }

    #[test]
    fn api_error_display() {
        let e = ApiError::Status {
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(e.to_string(), "HTTP 503: busy");
        let e = ApiError::Transport("dns".into());
        assert_eq!(e.to_string(), "Request failed: dns");
    }
}
