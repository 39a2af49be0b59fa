//! Request bodies sent to the IR-Flow API.
//!
//! Optional members are omitted when unset, except where the server expects
//! an explicit `null` (object type endpoints).

use serde::Serialize;
use serde_json::Value;

use crate::error::{IrFlowError, Result};

/// Body for `POST api/v1/alerts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAlert {
    /// Field name/value pairs as configured in IR-Flow.
    pub fields: Value,

    /// Suppress the server's warnings about missing fields.
    pub suppress_missing_field_warning: bool,

    /// Free-text alert description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the incoming field group (data source configuration).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_field_group_name: Option<String>,
}

impl NewAlert {
    /// Creates an alert body with the given fields.
    pub fn new(fields: Value) -> Self {
        Self {
            fields,
            suppress_missing_field_warning: false,
            description: None,
            data_field_group_name: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the incoming field group name.
    pub fn with_field_group(mut self, name: impl Into<String>) -> Self {
        self.data_field_group_name = Some(name.into());
        self
    }

    /// Suppresses missing-field warnings.
    pub fn suppress_missing_field_warning(mut self, suppress: bool) -> Self {
        self.suppress_missing_field_warning = suppress;
        self
    }
}

/// Body for `PUT api/v1/alerts/close`. Both members travel as strings.
#[derive(Debug, Clone, Serialize)]
pub struct CloseAlert {
    /// Alert number, stringified.
    pub alert_num: String,
    /// Name of a close reason configured on the server.
    pub close_reason_name: String,
}

impl CloseAlert {
    /// Creates a close body.
    pub fn new(alert_num: u64, close_reason: impl Into<String>) -> Self {
        Self {
            alert_num: alert_num.to_string(),
            close_reason_name: close_reason.into(),
        }
    }
}

/// Body for `PUT api/v1/fact_groups/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct FactGroupUpdate {
    /// Fact field name/value pairs.
    pub fields: Value,
}

/// Body for creating or updating an incident.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentBody {
    /// Field name/value pairs as configured in IR-Flow.
    pub fields: Value,

    /// Incident type name.
    pub incident_type_name: String,

    /// Incident subtype name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_subtype_name: Option<String>,

    /// Free-text incident description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IncidentBody {
    /// Creates an incident body of the given type.
    pub fn new(fields: Value, incident_type_name: impl Into<String>) -> Self {
        Self {
            fields,
            incident_type_name: incident_type_name.into(),
            incident_subtype_name: None,
            description: None,
        }
    }

    /// Sets the subtype.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.incident_subtype_name = Some(subtype.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body for adding a picklist item.
///
/// `picklist_id` is only sent to `api/v1/picklist_items`; the nested
/// `api/v1/picklists/{id}/picklist_items` route carries it in the path.
#[derive(Debug, Clone, Serialize)]
pub struct PicklistItemBody {
    /// Owning picklist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picklist_id: Option<u64>,

    /// Value submitted to actions and integrations.
    pub value: String,

    /// Label displayed for the item.
    pub label: String,

    /// Item description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Query parameters for listing picklists and picklist items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrashFilter {
    /// Include deleted entries.
    pub with_trashed: bool,
    /// List only deleted entries.
    pub only_trashed: bool,
}

impl TrashFilter {
    /// Active entries only.
    pub fn active() -> Self {
        Self::default()
    }

    /// Active and deleted entries.
    pub fn with_trashed() -> Self {
        Self {
            with_trashed: true,
            only_trashed: false,
        }
    }

    /// Deleted entries only.
    pub fn only_trashed() -> Self {
        Self {
            with_trashed: false,
            only_trashed: true,
        }
    }

    /// Returns the filter as query parameters.
    pub fn to_query(self) -> Vec<(&'static str, String)> {
        vec![
            ("with_trashed", self.with_trashed.to_string()),
            ("only_trashed", self.only_trashed.to_string()),
        ]
    }
}

/// Body for `POST api/v1/object_types`.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectTypeBody {
    /// Name of the new object type.
    pub type_name: String,
    /// Display label.
    pub type_label: String,
    /// Parent type by name.
    pub parent_type_name: Option<String>,
    /// Parent type by id.
    pub parent_type_id: Option<u64>,
}

impl ObjectTypeBody {
    /// Checks the body before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Precondition` when the name or label is empty or
    /// when neither parent reference is given.
    pub fn validate(&self) -> Result<()> {
        if self.type_name.trim().is_empty() {
            return Err(IrFlowError::precondition("type_name is required"));
        }
        if self.type_label.trim().is_empty() {
            return Err(IrFlowError::precondition("type_label is required"));
        }
        if self.parent_type_name.is_none() && self.parent_type_id.is_none() {
            return Err(IrFlowError::precondition(
                "either parent_type_name or parent_type_id is required",
            ));
        }
        Ok(())
    }
}

/// Body for `PUT api/v1/object_types/attach_field`.
#[derive(Debug, Clone, Serialize)]
pub struct AttachFieldBody {
    /// Target object type by name.
    pub object_type_name: Option<String>,
    /// Field by name.
    pub field_name: Option<String>,
    /// Target object type by id.
    pub object_type_id: Option<u64>,
    /// Field by id.
    pub field_id: Option<u64>,
}

impl AttachFieldBody {
    /// Checks the body before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Precondition` unless both the object type and the
    /// field are identified by name or id.
    pub fn validate(&self) -> Result<()> {
        if self.object_type_name.is_none() && self.object_type_id.is_none() {
            return Err(IrFlowError::precondition(
                "either object_type_name or object_type_id is required",
            ));
        }
        if self.field_name.is_none() && self.field_id.is_none() {
            return Err(IrFlowError::precondition(
                "either field_name or field_id is required",
            ));
        }
        Ok(())
    }
}

/// Record kinds that accept attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentTarget {
    /// `api/v1/alerts/{id}/attachments`
    Alerts,
    /// `api/v1/incidents/{id}/attachments`
    Incidents,
    /// `api/v1/tasks/{id}/attachments`
    Tasks,
}

impl AttachmentTarget {
    /// Returns the URL path segment for this record kind.
    pub fn as_path(self) -> &'static str {
        match self {
            AttachmentTarget::Alerts => "alerts",
            AttachmentTarget::Incidents => "incidents",
            AttachmentTarget::Tasks => "tasks",
        }
    }

    /// Singular name used in trace banners.
    pub(crate) fn label(self) -> &'static str {
        match self {
            AttachmentTarget::Alerts => "Alert",
            AttachmentTarget::Incidents => "Incident",
            AttachmentTarget::Tasks => "Task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_new_alert_omits_unset_members() {
        let body = NewAlert::new(json!({"Tier": "Tier1"}));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"fields": {"Tier": "Tier1"}, "suppress_missing_field_warning": false})
        );
    }

    #[test]
    fn test_new_alert_full() {
        let body = NewAlert::new(json!({"Risk": 3}))
            .with_description("Super Bad API Event")
            .with_field_group("ds_test")
            .suppress_missing_field_warning(true);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "fields": {"Risk": 3},
                "suppress_missing_field_warning": true,
                "description": "Super Bad API Event",
                "data_field_group_name": "ds_test",
            })
        );
    }

    #[test]
    fn test_close_alert_sends_strings() {
        let body = CloseAlert::new(17, "False Positive");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"alert_num": "17", "close_reason_name": "False Positive"})
        );
    }

    #[test]
    fn test_object_type_body_keeps_null_parents() {
        let body = ObjectTypeBody {
            type_name: "host".to_string(),
            type_label: "Host".to_string(),
            parent_type_name: Some("asset".to_string()),
            parent_type_id: None,
        };
        assert!(body.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "type_name": "host",
                "type_label": "Host",
                "parent_type_name": "asset",
                "parent_type_id": null,
            })
        );
    }

    #[test]
    fn test_object_type_body_requires_parent() {
        let body = ObjectTypeBody {
            type_name: "host".to_string(),
            type_label: "Host".to_string(),
            parent_type_name: None,
            parent_type_id: None,
        };
        let err = body.validate().unwrap_err();
        assert!(err.to_string().contains("parent_type_name"));
    }

    #[test]
    fn test_object_type_body_requires_name_and_label() {
        let mut body = ObjectTypeBody {
            type_name: " ".to_string(),
            type_label: "Host".to_string(),
            parent_type_name: None,
            parent_type_id: Some(1),
        };
        assert!(body.validate().unwrap_err().to_string().contains("type_name"));
        body.type_name = "host".to_string();
        body.type_label = String::new();
        assert!(body.validate().unwrap_err().to_string().contains("type_label"));
    }

    #[test]
    fn test_attach_field_body_validation() {
        let body = AttachFieldBody {
            object_type_name: None,
            field_name: Some("hostname".to_string()),
            object_type_id: None,
            field_id: None,
        };
        assert!(body.validate().is_err());

        let body = AttachFieldBody {
            object_type_id: Some(4),
            ..body
        };
        assert!(body.validate().is_ok());

        let body = AttachFieldBody {
            field_name: None,
            ..body
        };
        assert!(body.validate().unwrap_err().to_string().contains("field_id"));
    }

    #[test]
    fn test_trash_filter_presets() {
        assert_eq!(
            TrashFilter::only_trashed().to_query(),
            vec![
                ("with_trashed", "false".to_string()),
                ("only_trashed", "true".to_string()),
            ]
        );
        assert!(TrashFilter::with_trashed().with_trashed);
        assert_eq!(TrashFilter::active(), TrashFilter::default());
    }

    #[test]
    fn test_attachment_target_paths() {
        assert_eq!(AttachmentTarget::Alerts.as_path(), "alerts");
        assert_eq!(AttachmentTarget::Incidents.as_path(), "incidents");
        assert_eq!(AttachmentTarget::Tasks.as_path(), "tasks");
    }
}
