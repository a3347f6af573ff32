//! Data models for accounts, therapist profiles and moderated content

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role carried in auth tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Therapist,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Therapist => "therapist",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "therapist" => Ok(Role::Therapist),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A platform user (client seeking therapy)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An administrator account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a therapist sees clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsultationMode {
    Online,
    Offline,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub title: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// Details for online consultations; leaves arrive independently through
/// the approval flow, so all fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// The mutable body of a therapist record. Serialized as one JSON document;
/// the approval workflow diffs and patches it through `serde_json::Value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub specialization: Vec<String>,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub profile_link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub charges: String,
    #[serde(default)]
    pub availability_type: String,
    #[serde(default)]
    pub availability_slots: Vec<String>,
    #[serde(default)]
    pub service_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_mode: Option<ConsultationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_details: Option<OnlineDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_details: Option<OfflineDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

/// Status of an update request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected requests never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

/// One proposed change to a governed profile field, queued for admin review.
/// Lives in the ledger embedded in the therapist record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: Uuid,
    /// Dot-path naming the target attribute, e.g. `onlineDetails.platform`
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl UpdateRequest {
    pub fn new(field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            field: field.into(),
            old_value,
            new_value,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            reviewed_at: None,
        }
    }
}

/// A full therapist record: identity, profile document and embedded ledger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Therapist {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub approved: bool,
    #[serde(flatten)]
    pub profile: Profile,
    pub update_requests: Vec<UpdateRequest>,
    #[serde(skip_serializing)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Therapist {
    /// Ledger entries still awaiting review, in submission order
    pub fn pending_requests(&self) -> Vec<&UpdateRequest> {
        self.update_requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect()
    }
}

/// Kind of moderated content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Blog,
    Guide,
    Event,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::Guide => "guide",
            ContentKind::Event => "event",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(ContentKind::Blog),
            "guide" => Ok(ContentKind::Guide),
            "event" => Ok(ContentKind::Event),
            _ => Err(format!("Invalid content kind: {}", s)),
        }
    }
}

/// A blog, guide or event submitted by a therapist, hidden from public
/// listings until an admin approves it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    /// Kind-specific extras (steps, video link, event date, ...)
    pub meta: Value,
    pub author_id: Uuid,
    pub author_name: String,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request payloads

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateContentRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// Query string for paginated public content listings
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_status_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_request_status_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = Profile {
            name: "Dr. X".to_string(),
            offline_details: Some(OfflineDetails {
                clinic_name: Some("Wellness Ctr".to_string()),
                clinic_address: None,
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["name"], json!("Dr. X"));
        assert_eq!(value["offlineDetails"]["clinicName"], json!("Wellness Ctr"));
        assert!(value.get("consultationMode").is_none());
    }

    #[test]
    fn test_profile_deserializes_partial_nested() {
        // The resolver builds nested objects one leaf at a time
        let value = json!({
            "name": "Dr. X",
            "onlineDetails": { "platform": "Zoom" }
        });
        let profile: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(
            profile.online_details.unwrap().platform.as_deref(),
            Some("Zoom")
        );
    }

    #[test]
    fn test_consultation_mode_values() {
        assert_eq!(serde_json::to_value(ConsultationMode::Both).unwrap(), json!("Both"));
        let mode: ConsultationMode = serde_json::from_value(json!("Online")).unwrap();
        assert_eq!(mode, ConsultationMode::Online);
    }

    #[test]
    fn test_update_request_starts_pending() {
        let req = UpdateRequest::new("phone", json!(""), json!("555-0100"));
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(req.reviewed_at.is_none());
    }

    #[test]
    fn test_content_kind_round_trip() {
        for kind in [ContentKind::Blog, ContentKind::Guide, ContentKind::Event] {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("podcast".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_therapist_never_serializes_password() {
        let therapist = Therapist {
            id: Uuid::new_v4(),
            email: "t@example.com".to_string(),
            password_hash: "secret".to_string(),
            approved: false,
            profile: Profile::default(),
            update_requests: vec![],
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&therapist).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }
}
