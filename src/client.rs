//! HTTP client for the IR-Flow REST API.
//!
//! This module provides `IrFlowClient`, which maps one method to one endpoint.
//! Every JSON method returns the decoded response body as an [`Envelope`],
//! untouched: application failures (`"success": false`) are returned, not
//! raised, and nothing is retried.
//!
//! # Security
//!
//! The API key travels only in the `X-Authorization` session header, which is
//! marked sensitive. It is never logged and is redacted from debug traces and
//! from error bodies.

use std::path::Path;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::error::{IrFlowError, Result};
use crate::models::{
    AttachFieldBody, AttachmentTarget, CloseAlert, Envelope, FactGroupUpdate, IncidentBody,
    NewAlert, ObjectTypeBody, PicklistItemBody, TrashFilter,
};
use crate::trace::{DebugTrace, DiagnosticSink, TracingSink};

/// Path prefix shared by every endpoint.
const API_PREFIX: &str = "api/v1";

/// Session header carrying `"<api_user> <api_key>"`.
const AUTH_HEADER: &str = "x-authorization";

/// Content type of every JSON request.
const JSON_CONTENT: &str = "application/json";

/// Maximum length for non-JSON error bodies kept in `IrFlowError::HttpStatus`.
const MAX_ERROR_BODY_LEN: usize = 500;

/// HTTP client for the IR-Flow API.
///
/// Owns one authenticated session (a `reqwest::Client` with the
/// `X-Authorization` default header) reused by every call, and the debug
/// trace configured for it. Cloning shares the session.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_file("api.conf")?;
/// let client = IrFlowClient::new(&config)?;
///
/// let alert = client.get_alert(42).await?;
/// if alert.success() {
///     println!("{}", alert.as_value());
/// }
/// ```
#[derive(Clone)]
pub struct IrFlowClient {
    /// The shared session.
    http: Client,

    /// Server root, e.g. `https://irflow.example.com`.
    base_url: String,

    /// API key, kept for sanitizing error bodies.
    /// SECURITY: Never log this value!
    api_key: String,

    /// Authorization header as shown in traces, key redacted.
    auth_trace: String,

    /// Debug trace and its sink.
    trace: DebugTrace,
}

impl IrFlowClient {
    /// Creates a client whose debug trace goes to `tracing`.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::HttpClient` if the HTTP client fails to
    /// initialize, or `IrFlowError::InvalidValue` if the credentials cannot be
    /// sent as a header.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Creates a client whose debug trace goes to `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`IrFlowClient::new`].
    pub fn with_sink(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("{} {}", config.api_user, config.api_key()))
            .map_err(|_| IrFlowError::wrong_value())?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(AUTH_HEADER), auth);

        if !config.verify_tls {
            tracing::warn!(
                address = %config.address,
                "TLS certificate verification is disabled for the IR-Flow server"
            );
        }

        let http = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(IrFlowError::HttpClient)?;

        let trace = DebugTrace::new(config.debug, config.verbose, config.api_key(), sink);
        trace.lines(config.settings_dump());

        Ok(Self {
            http,
            base_url: config.base_url(),
            api_key: config.api_key().to_string(),
            auth_trace: format!("{} [REDACTED]", config.api_user),
            trace,
        })
    }

    /// Returns the server root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the first field object named `field_name`, if any.
    ///
    /// See [`crate::models::get_field_by_name`].
    pub fn get_field_by_name<'a>(field_name: &str, fields: &'a [Value]) -> Option<&'a Value> {
        crate::models::get_field_by_name(field_name, fields)
    }

    /// Builds the absolute URL of an endpoint path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    /// Headers shown in the debug trace.
    fn trace_headers(&self, json: bool) -> Vec<(&str, &str)> {
        let mut headers = vec![("X-Authorization", self.auth_trace.as_str())];
        if json {
            headers.push(("Content-Type", JSON_CONTENT));
            headers.push(("Accept", JSON_CONTENT));
        }
        headers
    }

    /// Sends a JSON request and decodes the envelope.
    ///
    /// # Arguments
    ///
    /// * `title` - Name of the call in the debug trace
    /// * `method` - HTTP method
    /// * `path` - Endpoint path below `api/v1`
    /// * `query` - Query parameters
    /// * `body` - Optional JSON body
    async fn send_json(
        &self,
        title: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Envelope> {
        let url = self.endpoint(path);

        tracing::debug!(method = %method, path = %path, "Making IR-Flow API request");
        self.trace.request(title, &url, &self.trace_headers(true), body.as_ref());

        let mut req = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, JSON_CONTENT)
            .header(ACCEPT, JSON_CONTENT);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(IrFlowError::Http)?;
        self.decode(title, response).await
    }

    /// Serializes a request body for [`send_json`](Self::send_json).
    fn body<T: serde::Serialize>(value: &T) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(value)?))
    }

    /// Decodes a response body as an envelope, whatever the HTTP status.
    async fn decode(&self, title: &str, response: Response) -> Result<Envelope> {
        let status = response.status();
        self.trace.status(title, status);

        let body = response.text().await.map_err(IrFlowError::Http)?;

        match serde_json::from_str::<Value>(&body) {
            Ok(raw) => {
                self.trace.response_body(&raw);
                Ok(Envelope::new(raw))
            }
            Err(e) if status.is_success() => Err(IrFlowError::Serialization(e)),
            Err(_) => Err(self.status_error(status, &body)),
        }
    }

    /// Builds an error for a non-success response without a JSON body.
    fn status_error(&self, status: StatusCode, body: &str) -> IrFlowError {
        let body = IrFlowError::sanitize_message(body, &self.api_key);
        let body = if body.chars().count() > MAX_ERROR_BODY_LEN {
            format!(
                "{}...[truncated]",
                body.chars().take(MAX_ERROR_BODY_LEN).collect::<String>()
            )
        } else {
            body
        };

        tracing::debug!(status = %status, "IR-Flow server returned a non-JSON error body");
        IrFlowError::HttpStatus { status, body }
    }

    /// Reads the version reported by the server.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::UnexpectedResponse` if `data.version` is missing
    /// or not a string.
    pub async fn get_version(&self) -> Result<String> {
        let envelope = self
            .send_json("Get Version", Method::GET, "version", &[], None)
            .await?;

        envelope
            .pointer("/data/version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                IrFlowError::UnexpectedResponse(format!(
                    "no version string in response: {}",
                    envelope.message().unwrap_or("(no message)")
                ))
            })
    }

    /// Creates an alert.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let alert = NewAlert::new(json!({"Tier": "Tier1", "Risk": 3}))
    ///     .with_description("Super Bad API Event")
    ///     .with_field_group("ds_test");
    /// let created = client.create_alert(&alert).await?;
    /// let alert_num = created.pointer("/data/alert/alert_num");
    /// ```
    pub async fn create_alert(&self, alert: &NewAlert) -> Result<Envelope> {
        self.send_json("Create Alert", Method::POST, "alerts", &[], Self::body(alert)?)
            .await
    }

    /// Retrieves an alert by its alert number.
    pub async fn get_alert(&self, alert_num: u64) -> Result<Envelope> {
        self.send_json(
            "Get Alert",
            Method::GET,
            &format!("alerts/{}", alert_num),
            &[],
            None,
        )
        .await
    }

    /// Closes an alert for the named close reason.
    ///
    /// An unknown reason is reported by the server as `"success": false`.
    pub async fn close_alert(&self, alert_num: u64, close_reason: &str) -> Result<Envelope> {
        let body = CloseAlert::new(alert_num, close_reason);
        self.send_json(
            "Close Alert",
            Method::PUT,
            "alerts/close",
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Attaches an alert to an incident through the alert-side route.
    #[deprecated(note = "use `attach_alert_to_incident`, the server will drop this route")]
    pub async fn attach_incident_to_alert(
        &self,
        incident_num: u64,
        alert_num: u64,
    ) -> Result<Envelope> {
        self.send_json(
            "Attach Incident to Alert",
            Method::PUT,
            &format!("alerts/{}/incident/{}", alert_num, incident_num),
            &[],
            None,
        )
        .await
    }

    /// Retrieves the current facts of a fact group.
    pub async fn get_fact_group(&self, fact_group_id: u64) -> Result<Envelope> {
        self.send_json(
            "Get Fact Group",
            Method::GET,
            &format!("fact_groups/{}", fact_group_id),
            &[],
            None,
        )
        .await
    }

    /// Writes new or updated fact values to a fact group.
    ///
    /// # Arguments
    ///
    /// * `fact_group_id` - The fact group to update
    /// * `fields` - Fact field name/value pairs
    pub async fn put_fact_group(&self, fact_group_id: u64, fields: Value) -> Result<Envelope> {
        let body = FactGroupUpdate { fields };
        self.send_json(
            "Put Fact Group",
            Method::PUT,
            &format!("fact_groups/{}", fact_group_id),
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Creates an incident.
    pub async fn create_incident(&self, incident: &IncidentBody) -> Result<Envelope> {
        self.send_json(
            "Create Incident",
            Method::POST,
            "incidents",
            &[],
            Self::body(incident)?,
        )
        .await
    }

    /// Retrieves an incident.
    pub async fn get_incident(&self, incident_num: u64) -> Result<Envelope> {
        self.send_json(
            "Get Incident",
            Method::GET,
            &format!("incidents/{}", incident_num),
            &[],
            None,
        )
        .await
    }

    /// Updates an incident's fields, type, subtype and description.
    pub async fn update_incident(
        &self,
        incident_num: u64,
        incident: &IncidentBody,
    ) -> Result<Envelope> {
        self.send_json(
            "Update Incident",
            Method::PUT,
            &format!("incidents/{}", incident_num),
            &[],
            Self::body(incident)?,
        )
        .await
    }

    /// Attaches an alert to an incident.
    pub async fn attach_alert_to_incident(
        &self,
        alert_num: u64,
        incident_num: u64,
    ) -> Result<Envelope> {
        self.send_json(
            "Attach Alert to Incident",
            Method::PUT,
            &format!("incidents/{}/alerts/{}", incident_num, alert_num),
            &[],
            None,
        )
        .await
    }

    /// Lists picklists. The server's answer is returned as is, without paging.
    pub async fn list_picklists(&self, filter: TrashFilter) -> Result<Envelope> {
        self.send_json(
            "Get List of Picklists",
            Method::GET,
            "picklists",
            &filter.to_query(),
            None,
        )
        .await
    }

    /// Retrieves a picklist.
    pub async fn get_picklist(&self, picklist_id: u64) -> Result<Envelope> {
        self.send_json(
            "Get Picklist",
            Method::GET,
            &format!("picklists/{}", picklist_id),
            &[],
            None,
        )
        .await
    }

    /// Adds an item to a picklist through the picklist route.
    pub async fn add_item_to_picklist(
        &self,
        picklist_id: u64,
        value: &str,
        label: &str,
        description: Option<&str>,
    ) -> Result<Envelope> {
        let body = PicklistItemBody {
            picklist_id: None,
            value: value.to_string(),
            label: label.to_string(),
            description: description.map(str::to_string),
        };
        self.send_json(
            "Add Item to Picklist",
            Method::POST,
            &format!("picklists/{}/picklist_items", picklist_id),
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Lists the items of a picklist. The server's answer is returned as is.
    pub async fn list_picklist_items(
        &self,
        picklist_id: u64,
        filter: TrashFilter,
    ) -> Result<Envelope> {
        let mut query = vec![("picklist_id", picklist_id.to_string())];
        query.extend(filter.to_query());
        self.send_json(
            "Get List of Picklist Items",
            Method::GET,
            "picklist_items",
            &query,
            None,
        )
        .await
    }

    /// Creates a picklist item.
    pub async fn create_picklist_item(
        &self,
        picklist_id: u64,
        value: &str,
        label: &str,
        description: Option<&str>,
    ) -> Result<Envelope> {
        let body = PicklistItemBody {
            picklist_id: Some(picklist_id),
            value: value.to_string(),
            label: label.to_string(),
            description: description.map(str::to_string),
        };
        self.send_json(
            "Add Picklist Item",
            Method::POST,
            "picklist_items",
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Retrieves a picklist item.
    pub async fn get_picklist_item(&self, picklist_item_id: u64) -> Result<Envelope> {
        self.send_json(
            "Get Picklist Item",
            Method::GET,
            &format!("picklist_items/{}", picklist_item_id),
            &[],
            None,
        )
        .await
    }

    /// Restores a deleted picklist item.
    pub async fn restore_picklist_item(&self, picklist_item_id: u64) -> Result<Envelope> {
        self.send_json(
            "Restore Picklist Item",
            Method::PUT,
            &format!("picklist_items/{}/restore", picklist_item_id),
            &[],
            None,
        )
        .await
    }

    /// Marks a picklist item as deleted.
    pub async fn delete_picklist_item(&self, picklist_item_id: u64) -> Result<Envelope> {
        self.send_json(
            "Delete Picklist Item",
            Method::DELETE,
            &format!("picklist_items/{}", picklist_item_id),
            &[],
            None,
        )
        .await
    }

    /// Creates an object type under a parent given by name or id.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Precondition`, without sending anything, when the
    /// name or label is empty or no parent is given.
    pub async fn create_object_type(
        &self,
        type_name: &str,
        type_label: &str,
        parent_type_name: Option<&str>,
        parent_type_id: Option<u64>,
    ) -> Result<Envelope> {
        let body = ObjectTypeBody {
            type_name: type_name.to_string(),
            type_label: type_label.to_string(),
            parent_type_name: parent_type_name.map(str::to_string),
            parent_type_id,
        };
        body.validate()?;

        self.send_json(
            "Store Object Type",
            Method::POST,
            "object_types",
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Attaches an existing field to an object type.
    ///
    /// The object type and the field are each identified by name or by id.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Precondition`, without sending anything, when
    /// either one is not identified.
    pub async fn attach_field_to_object_type(
        &self,
        object_type_name: Option<&str>,
        field_name: Option<&str>,
        object_type_id: Option<u64>,
        field_id: Option<u64>,
    ) -> Result<Envelope> {
        let body = AttachFieldBody {
            object_type_name: object_type_name.map(str::to_string),
            field_name: field_name.map(str::to_string),
            object_type_id,
            field_id,
        };
        body.validate()?;

        self.send_json(
            "Attach Field to Object Type",
            Method::PUT,
            "object_types/attach_field",
            &[],
            Self::body(&body)?,
        )
        .await
    }

    /// Lists the attachments of an alert, incident or task.
    pub async fn list_attachments(&self, target: AttachmentTarget, id: u64) -> Result<Envelope> {
        self.send_json(
            &format!("List {} Attachments", target.label()),
            Method::GET,
            &format!("{}/{}/attachments", target.as_path(), id),
            &[],
            None,
        )
        .await
    }

    /// Uploads a file as a multipart attachment to an alert, incident or task.
    ///
    /// The file is read inside this call and released before it returns.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Io` if the file cannot be read; nothing is sent.
    pub async fn upload_attachment(
        &self,
        target: AttachmentTarget,
        id: u64,
        path: impl AsRef<Path>,
    ) -> Result<Envelope> {
        let path = path.as_ref();
        let title = format!("Upload Attachment to {}", target.label());
        let url = self.endpoint(&format!("{}/{}/attachments", target.as_path(), id));

        let contents = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        tracing::debug!(
            resource = target.as_path(),
            id,
            bytes = contents.len(),
            "Uploading attachment"
        );
        self.trace.request(&title, &url, &self.trace_headers(false), None);

        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name));
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(IrFlowError::Http)?;

        self.decode(&title, response).await
    }

    /// Uploads a file to an alert.
    pub async fn upload_attachment_to_alert(
        &self,
        alert_num: u64,
        path: impl AsRef<Path>,
    ) -> Result<Envelope> {
        self.upload_attachment(AttachmentTarget::Alerts, alert_num, path)
            .await
    }

    /// Uploads a file to an incident.
    pub async fn upload_attachment_to_incident(
        &self,
        incident_id: u64,
        path: impl AsRef<Path>,
    ) -> Result<Envelope> {
        self.upload_attachment(AttachmentTarget::Incidents, incident_id, path)
            .await
    }

    /// Uploads a file to a task.
    pub async fn upload_attachment_to_task(
        &self,
        task_id: u64,
        path: impl AsRef<Path>,
    ) -> Result<Envelope> {
        self.upload_attachment(AttachmentTarget::Tasks, task_id, path)
            .await
    }

    /// Starts an attachment download and traces it.
    async fn start_download(&self, attachment_id: u64) -> Result<Response> {
        let url = self.endpoint(&format!("attachments/{}/download", attachment_id));

        tracing::debug!(attachment_id, "Downloading attachment");
        self.trace
            .request("Download Attachment", &url, &self.trace_headers(false), None);

        let response = self.http.get(&url).send().await.map_err(IrFlowError::Http)?;
        self.trace.status("Download Attachment", response.status());
        Ok(response)
    }

    /// Streams an attachment into `dest`, creating or truncating it.
    ///
    /// The body is copied as received whatever the HTTP status.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    pub async fn download_attachment(
        &self,
        attachment_id: u64,
        dest: impl AsRef<Path>,
    ) -> Result<u64> {
        let mut response = self.start_download(attachment_id).await?;
        let mut file = tokio::fs::File::create(dest.as_ref()).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(IrFlowError::Http)? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Streams an attachment into memory and returns its bytes.
    pub async fn download_attachment_bytes(&self, attachment_id: u64) -> Result<Vec<u8>> {
        let mut response = self.start_download(attachment_id).await?;

        let mut contents = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(IrFlowError::Http)? {
            contents.extend_from_slice(&chunk);
        }

        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tests::RecordingSink;

    fn test_config() -> Config {
        Config::new("irflow.example.com/", "api_user", "0123456789abcdef").unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = IrFlowClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "https://irflow.example.com");
        assert_eq!(
            client.endpoint("alerts/7"),
            "https://irflow.example.com/api/v1/alerts/7"
        );
    }

    #[test]
    fn test_trace_headers_redact_key() {
        let client = IrFlowClient::new(&test_config()).unwrap();
        let headers = client.trace_headers(true);
        assert_eq!(headers[0], ("X-Authorization", "api_user [REDACTED]"));
        assert_eq!(headers.len(), 3);
        assert_eq!(client.trace_headers(false).len(), 1);
    }

    #[test]
    fn test_debug_client_dumps_settings() {
        let sink = Arc::new(RecordingSink::default());
        let config = test_config().with_debug(true);
        IrFlowClient::with_sink(&config, sink.clone()).unwrap();

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines[0], "========== IRFlowAPI Created ==========");
        assert!(lines.iter().all(|l| !l.contains("0123456789abcdef")));
    }

    #[test]
    fn test_quiet_client_dumps_nothing() {
        let sink = Arc::new(RecordingSink::default());
        IrFlowClient::with_sink(&test_config(), sink.clone()).unwrap();
        assert!(sink.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_status_error_truncates_body() {
        let client = IrFlowClient::new(&test_config()).unwrap();
        let body = "x".repeat(MAX_ERROR_BODY_LEN + 10);
        assert!(matches!(
            client.status_error(StatusCode::UNAUTHORIZED, "bad key 0123456789abcdef"),
            IrFlowError::HttpStatus { ref body, .. } if body == "bad key [REDACTED]"
        ));
        match client.status_error(StatusCode::BAD_GATEWAY, &body) {
            IrFlowError::HttpStatus { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert!(body.ends_with("...[truncated]"));
                assert_eq!(body.len(), MAX_ERROR_BODY_LEN + "...[truncated]".len());
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_get_field_by_name_delegates() {
        let facts = vec![serde_json::json!({"field": {"field_name": "Tier", "value": "Tier1"}})];
        assert!(IrFlowClient::get_field_by_name("Tier", &facts).is_some());
        assert!(IrFlowClient::get_field_by_name("Risk", &facts).is_none());
    }
}
