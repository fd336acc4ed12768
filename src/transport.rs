//! Requests for single rows and votes, and a `fetch`-based transport for them.

use crate::{
	model::{null_as_default, RowKey, StatusAction, TestResult},
	payload::{PayloadError, SingleRowPayload},
};
use futures::{future::LocalBoxFuture, FutureExt};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
/// Carries the session id on REST requests.
pub const SESSION_HEADER: &str = "X-SurveyTool-Session";

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("no browser window is available")]
	NoWindow,
	#[error("request failed: {0}")]
	Js(String),
	#[error("HTTP {status} {message}")]
	Http { status: u16, message: String },
	#[error("could not decode response: {0}")]
	Decode(#[from] serde_json::Error),
	#[error(transparent)]
	Payload(#[from] PayloadError),
}

/// Which server API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiStyle {
	/// `SurveyAjax` with query-string commands.
	Legacy,
	/// `api/voting/…`
	Rest,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
	/// Prefix of all request URLs, without a trailing slash.
	pub base_url: String,
	pub api_style: ApiStyle,
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			base_url: "/cldr-apps".to_owned(),
			api_style: ApiStyle::Rest,
		}
	}
}

/// Everything needed to fetch one row again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRequest {
	pub locale: String,
	pub row_key: RowKey,
	pub path_hash: String,
	pub path_id: Option<u64>,
	/// Also ask for dashboard data.
	pub dashboard: bool,
	pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
	pub row: RowRequest,
	/// [`None`] together with [`None`] `value` means abstain.
	pub value_hash: Option<String>,
	pub value: Option<String>,
}

/// The server's answer to a vote.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAck {
	/// A server error, or the reason the REST API gives for not submitting.
	#[serde(default, alias = "didNotSubmit")]
	pub err: Option<String>,
	/// Whether the vote went through (as opposed to being held back by test results).
	#[serde(default, alias = "submitResultRaw", alias = "didVote", deserialize_with = "truthy")]
	pub submitted: bool,
	#[serde(default, deserialize_with = "null_as_default")]
	pub test_results: Vec<TestResult>,
	#[serde(default)]
	pub status_action: Option<StatusAction>,
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Null => false,
		Value::Bool(value) => value,
		Value::String(value) => !value.is_empty(),
		Value::Number(value) => value.as_f64().map_or(true, |value| value != 0.0),
		Value::Array(_) | Value::Object(_) => true,
	})
}

impl TransportConfig {
	#[must_use]
	pub fn row_url(&self, request: &RowRequest) -> String {
		match self.api_style {
			ApiStyle::Legacy => {
				let mut url = format!(
					"{}/SurveyAjax?what=getrow&_={}&xpath={}&fhash={}&automatic=t",
					self.base_url,
					urlencoding::encode(&request.locale),
					request.path_id.map(|path_id| path_id.to_string()).unwrap_or_default(),
					urlencoding::encode(&request.row_key),
				);
				if request.dashboard {
					url.push_str("&dashboard=true");
				}
				if let Some(session_id) = &request.session_id {
					url.push_str("&s=");
					url.push_str(&urlencoding::encode(session_id));
				}
				url
			}
			ApiStyle::Rest => {
				let mut url = format!("{}/api/voting/{}/row/{}", self.base_url, urlencoding::encode(&request.locale), urlencoding::encode(&request.path_hash));
				if request.dashboard {
					url.push_str("?dashboard=true");
				}
				url
			}
		}
	}

	#[must_use]
	pub fn vote_url(&self, request: &VoteRequest) -> String {
		match self.api_style {
			ApiStyle::Legacy => format!("{}/SurveyAjax", self.base_url),
			ApiStyle::Rest => format!("{}/api/voting/{}/row/{}", self.base_url, urlencoding::encode(&request.row.locale), urlencoding::encode(&request.row.path_hash)),
		}
	}

	/// Extra request headers. The REST API reads the session from [`SESSION_HEADER`] instead of the query string.
	#[must_use]
	pub fn headers(&self, request: &RowRequest) -> Vec<(&'static str, String)> {
		match (self.api_style, &request.session_id) {
			(ApiStyle::Rest, Some(session_id)) => vec![(SESSION_HEADER, session_id.clone())],
			_ => Vec::new(),
		}
	}

	/// Content type and body of the vote `POST`.
	#[must_use]
	pub fn vote_body(&self, request: &VoteRequest) -> (&'static str, String) {
		match self.api_style {
			ApiStyle::Legacy => {
				let mut body = format!(
					"what=submit&xpath={}&_={}&fhash={}&vhash={}",
					request.row.path_id.map(|path_id| path_id.to_string()).unwrap_or_default(),
					urlencoding::encode(&request.row.locale),
					urlencoding::encode(&request.row.row_key),
					urlencoding::encode(request.value_hash.as_deref().unwrap_or_default()),
				);
				if let Some(session_id) = &request.row.session_id {
					body.push_str("&s=");
					body.push_str(&urlencoding::encode(session_id));
				}
				if let Some(value) = &request.value {
					body.push_str("&value=");
					body.push_str(&urlencoding::encode(value));
				}
				(FORM_CONTENT_TYPE, body)
			}
			ApiStyle::Rest => (JSON_CONTENT_TYPE, serde_json::json!({ "value": request.value, "valueHash": request.value_hash }).to_string()),
		}
	}
}

/// Carries row fetches and votes to the server.
///
/// The returned futures must not borrow the transport, so that callers can hold on to nothing across `.await`s.
pub trait RowTransport {
	fn fetch_row(&self, request: RowRequest) -> LocalBoxFuture<'static, Result<SingleRowPayload, TransportError>>;
	fn submit_vote(&self, request: VoteRequest) -> LocalBoxFuture<'static, Result<VoteAck, TransportError>>;
}

/// [`RowTransport`] using the browser's `fetch`.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
	pub config: TransportConfig,
}

impl FetchTransport {
	#[must_use]
	pub fn new(config: TransportConfig) -> Self {
		Self { config }
	}
}

impl RowTransport for FetchTransport {
	fn fetch_row(&self, request: RowRequest) -> LocalBoxFuture<'static, Result<SingleRowPayload, TransportError>> {
		let mut url = self.config.row_url(&request);
		if self.config.api_style == ApiStyle::Legacy {
			url.push_str(&format!("&cacheKill={}", js_sys::Date::now()));
		}
		let headers = self.config.headers(&request);
		async move {
			let text = fetch_text(url, headers, None).await?;
			Ok(SingleRowPayload::from_json(&text)?)
		}
		.boxed_local()
	}

	fn submit_vote(&self, request: VoteRequest) -> LocalBoxFuture<'static, Result<VoteAck, TransportError>> {
		let url = self.config.vote_url(&request);
		let body = self.config.vote_body(&request);
		let headers = self.config.headers(&request.row);
		async move {
			let text = fetch_text(url, headers, Some(body)).await?;
			Ok(serde_json::from_str(&text)?)
		}
		.boxed_local()
	}
}

fn js_error(value: JsValue) -> TransportError {
	TransportError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// `GET`s `url`, or `POST`s `body` (content type, content) to it.
#[instrument(skip(headers, body))]
async fn fetch_text(url: String, headers: Vec<(&'static str, String)>, body: Option<(&'static str, String)>) -> Result<String, TransportError> {
	let init = web_sys::RequestInit::new();
	let request_headers = web_sys::Headers::new().map_err(js_error)?;
	for (name, value) in &headers {
		request_headers.set(name, value).map_err(js_error)?;
	}
	match &body {
		Some((content_type, content)) => {
			init.set_method("POST");
			init.set_body(&JsValue::from_str(content));
			request_headers.set("Content-Type", content_type).map_err(js_error)?;
		}
		None => init.set_method("GET"),
	}
	init.set_headers(&request_headers);
	let request = web_sys::Request::new_with_str_and_init(&url, &init).map_err(js_error)?;

	let window = web_sys::window().ok_or(TransportError::NoWindow)?;
	let response = JsFuture::from(window.fetch_with_request(&request)).await.map_err(js_error)?;
	let response: web_sys::Response = response.dyn_into().map_err(js_error)?;
	if !response.ok() {
		return Err(TransportError::Http {
			status: response.status(),
			message: response.status_text(),
		});
	}

	let text = JsFuture::from(response.text().map_err(js_error)?).await.map_err(js_error)?;
	trace!("Received response.");
	text.as_string().ok_or_else(|| TransportError::Js("response body is not text".to_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request() -> RowRequest {
		RowRequest {
			locale: "de_CH".to_owned(),
			row_key: "_x5a3c".to_owned(),
			path_hash: "5a3c".to_owned(),
			path_id: Some(1234),
			dashboard: false,
			session_id: Some("S1".to_owned()),
		}
	}

	#[test]
	fn legacy_row_url() {
		let config = TransportConfig { base_url: "/cldr-apps".to_owned(), api_style: ApiStyle::Legacy };
		let mut request = request();
		request.dashboard = true;
		assert_eq!(config.row_url(&request), "/cldr-apps/SurveyAjax?what=getrow&_=de_CH&xpath=1234&fhash=_x5a3c&automatic=t&dashboard=true&s=S1");
	}

	#[test]
	fn rest_urls() {
		let config = TransportConfig::default();
		assert_eq!(config.row_url(&request()), "/cldr-apps/api/voting/de_CH/row/5a3c");
		let vote = VoteRequest { row: request(), value_hash: Some("h".to_owned()), value: Some("Grüezi".to_owned()) };
		assert_eq!(config.vote_url(&vote), "/cldr-apps/api/voting/de_CH/row/5a3c");
		let (content_type, body) = config.vote_body(&vote);
		assert_eq!(content_type, JSON_CONTENT_TYPE);
		assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["value"], "Grüezi");
	}

	#[test]
	fn legacy_vote_body_is_form_encoded() {
		let config = TransportConfig { base_url: String::new(), api_style: ApiStyle::Legacy };
		let vote = VoteRequest { row: request(), value_hash: None, value: Some("a b".to_owned()) };
		let (content_type, body) = config.vote_body(&vote);
		assert_eq!(content_type, FORM_CONTENT_TYPE);
		assert_eq!(body, "what=submit&xpath=1234&_=de_CH&fhash=_x5a3c&vhash=&s=S1&value=a%20b");
	}

	#[test]
	fn session_travels_in_a_header_only_for_rest() {
		let rest = TransportConfig::default();
		assert_eq!(rest.headers(&request()), [(SESSION_HEADER, "S1".to_owned())]);
		assert!(!rest.row_url(&request()).contains("S1"));

		let mut anonymous = request();
		anonymous.session_id = None;
		assert!(rest.headers(&anonymous).is_empty());

		let legacy = TransportConfig { base_url: String::new(), api_style: ApiStyle::Legacy };
		assert!(legacy.headers(&request()).is_empty());
	}

	#[test]
	fn rest_vote_response_with_null_test_results() {
		let ack: VoteAck = serde_json::from_str(r#"{"didVote": true, "didNotSubmit": null, "testResults": null, "testWarnings": false}"#).unwrap();
		assert!(ack.submitted);
		assert!(ack.test_results.is_empty());
		assert_eq!(ack.err, None);

		let ack: VoteAck = serde_json::from_str(r#"{"didVote": false, "didNotSubmit": "Vote not allowed", "testResults": null}"#).unwrap();
		assert_eq!(ack.err.as_deref(), Some("Vote not allowed"));
	}

	#[test]
	fn ack_truthiness() {
		let ack: VoteAck = serde_json::from_str(r#"{"submitResultRaw": "OK", "testResults": []}"#).unwrap();
		assert!(ack.submitted);
		let ack: VoteAck = serde_json::from_str(r#"{"didVote": false, "testResults": [{"type": "Error", "message": "bad"}]}"#).unwrap();
		assert!(!ack.submitted);
		assert_eq!(ack.test_results.len(), 1);
	}
}
