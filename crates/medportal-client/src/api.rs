//! Role-scoped portal endpoints.
//!
//! Thin wrappers over the gateway: they never handle authentication errors
//! themselves, the gateway already did.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::gateway::HttpGateway;
use crate::types::unwrap_data;

#[derive(Clone)]
pub struct PortalApi {
    gateway: Arc<HttpGateway>,
}

impl PortalApi {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// `GET /doctor/dashboard`
    pub async fn doctor_dashboard(&self) -> Result<Value> {
        self.fetch("/doctor/dashboard").await
    }

    /// `GET /lab/dashboard`
    pub async fn lab_dashboard(&self) -> Result<Value> {
        self.fetch("/lab/dashboard").await
    }

    /// `GET /patient/dashboard`
    pub async fn patient_dashboard(&self) -> Result<Value> {
        self.fetch("/patient/dashboard").await
    }

    /// `GET /admin/doctors`
    pub async fn admin_doctors(&self) -> Result<Vec<DoctorRecord>> {
        let data = self.fetch("/admin/doctors").await?;
        let list = match data {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("doctors") {
                Some(Value::Array(items)) => items,
                _ => return Err(self.malformed("doctor listing is not an array")),
            },
            Value::Null => Vec::new(),
            _ => return Err(self.malformed("doctor listing is not an array")),
        };
        list.into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| self.malformed(e.to_string())))
            .collect()
    }

    /// `PUT /admin/doctors/{id}/verify`
    pub async fn verify_doctor(&self, id: u64) -> Result<Value> {
        let body = self
            .gateway
            .put(&format!("/admin/doctors/{id}/verify"), None)
            .await?;
        Ok(unwrap_data(body))
    }

    fn malformed(&self, message: impl Into<String>) -> GatewayError {
        self.gateway.reject(GatewayError::decode(message))
    }

    async fn fetch(&self, path: &str) -> Result<Value> {
        self.gateway.get(path).await.map(unwrap_data)
    }
}

/// Entry of the admin doctor listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default, alias = "is_verified")]
    pub verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client-side filter for the doctor listing.
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
    /// Keep only doctors with this verification state.
    pub verified: Option<bool>,
}

impl DoctorFilter {
    pub fn matches(&self, doctor: &DoctorRecord) -> bool {
        if let Some(verified) = self.verified
            && doctor.verified != verified
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                doctor.name.to_lowercase().contains(&needle)
                    || doctor.email.to_lowercase().contains(&needle)
            }
        }
    }
}

pub fn filter_doctors<'a>(
    doctors: &'a [DoctorRecord],
    filter: &'a DoctorFilter,
) -> impl Iterator<Item = &'a DoctorRecord> {
    doctors.iter().filter(move |d| filter.matches(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doctors() -> Vec<DoctorRecord> {
        serde_json::from_value(json!([
            {"id": 1, "name": "Ada Grey", "email": "ada@clinic.test", "is_verified": true},
            {"id": 2, "name": "Ben Stone", "email": "ben@clinic.test", "verified": false,
             "specialization": "Cardiology", "phone": "555"},
            {"id": 3, "name": "Cora Lee", "email": "cora@lab.test"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_doctor_record_keeps_unknown_fields() {
        let list = doctors();
        assert!(list[0].verified);
        assert_eq!(list[1].specialization.as_deref(), Some("Cardiology"));
        assert_eq!(list[1].extra.get("phone"), Some(&json!("555")));
        assert!(!list[2].verified);
    }

    #[test]
    fn test_filter_by_search_and_state() {
        let list = doctors();

        let filter = DoctorFilter {
            search: Some("CLINIC".into()),
            verified: None,
        };
        let ids: Vec<u64> = filter_doctors(&list, &filter).map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let filter = DoctorFilter {
            search: Some("clinic".into()),
            verified: Some(false),
        };
        let ids: Vec<u64> = filter_doctors(&list, &filter).map(|d| d.id).collect();
        assert_eq!(ids, vec![2]);

        let filter = DoctorFilter {
            search: Some("  ".into()),
            verified: None,
        };
        assert_eq!(filter_doctors(&list, &filter).count(), 3);
    }
}
