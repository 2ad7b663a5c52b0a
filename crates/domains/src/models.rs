//! # Domain Models
//!
//! These structs represent the core entities of PinPoint.
//! Documents travel over the wire as JSON-like field maps; the conversion
//! helpers here tolerate the historical record shapes still present in the
//! backing collection (missing fields, pre-formatted date strings).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// A document as stored: an ordered JSON object of named fields.
pub type DocumentFields = serde_json::Map<String, Value>;

/// Wire-level field names of a lost-item document.
pub mod field {
    pub const OWNER_ID: &str = "ownerId";
    pub const ITEM_NAME: &str = "itemName";
    pub const LOCATION: &str = "location";
    pub const DESCRIPTION: &str = "description";
    pub const ADDITIONAL_INFO: &str = "additionalInfo";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const STATUS: &str = "status";
    pub const DATE_POSTED: &str = "datePosted";
    pub const USER_NAME: &str = "userName";
    pub const IMAGE_URL: &str = "imageUrl";
    pub const STORAGE_PATH: &str = "storagePath";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const CONTACT_INFO: &str = "contactInfo";
}

/// Lifecycle status of a lost-item report. The only exposed transition is
/// `Lost` → `Found`; a record with no status field defaults to `Lost`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    Lost,
    Found,
}

impl ItemStatus {
    /// Case-insensitive parse. Anything that is not "found" reads as `Lost`,
    /// matching how historical records spelled the field.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("found") {
            ItemStatus::Found
        } else {
            ItemStatus::Lost
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Lost => "Lost",
            ItemStatus::Found => "Found",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The moment a report was posted, in the three shapes the collection has
/// accumulated: a native timestamp (stored as epoch milliseconds), a
/// pre-formatted display string written by early app versions, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostedDate {
    Timestamp(DateTime<Utc>),
    Legacy(String),
    Unset,
}

impl PostedDate {
    /// Reads the `datePosted` field. Numbers are epoch milliseconds, strings
    /// pass through as legacy pre-formatted dates, anything else is unset.
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
                Some(ts) => PostedDate::Timestamp(ts),
                None => PostedDate::Unset,
            },
            Some(Value::String(s)) => PostedDate::Legacy(s.clone()),
            _ => PostedDate::Unset,
        }
    }

    pub fn to_field(&self) -> Option<Value> {
        match self {
            PostedDate::Timestamp(ts) => Some(Value::from(ts.timestamp_millis())),
            PostedDate::Legacy(s) => Some(Value::from(s.clone())),
            PostedDate::Unset => None,
        }
    }

    /// Display form, "MMM dd, yyyy" (e.g. "Dec 03, 2025"). Legacy strings are
    /// already formatted and pass through verbatim.
    pub fn display(&self) -> String {
        match self {
            PostedDate::Timestamp(ts) => ts.format("%b %d, %Y").to_string(),
            PostedDate::Legacy(s) => s.clone(),
            PostedDate::Unset => String::new(),
        }
    }

    /// Chronological sort key. Legacy strings carry no reliable ordering
    /// (month abbreviations do not sort chronologically), so only native
    /// timestamps yield a key.
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        match self {
            PostedDate::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// One lost-item report, the canonical entity of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostItemRecord {
    /// Document id; assigned by the store (or pre-generated for photo
    /// uploads) and immutable for the life of the record.
    pub id: String,
    /// Identity of the reporting user, set once at creation.
    pub owner_id: String,
    pub item_name: String,
    /// Free-text specific location ("3rd floor of the library").
    pub location: String,
    pub description: String,
    pub additional_info: String,
    pub city: String,
    pub state: String,
    pub status: ItemStatus,
    pub date_posted: PostedDate,
    /// Display-name snapshot taken at creation; not re-synced on rename.
    pub user_name: String,
    /// Publicly fetchable photo URL; empty when there is no photo.
    pub image_url: String,
    /// Blob path backing `image_url`; set and cleared together with it.
    pub storage_path: String,
    /// 0.0 means "unset"; there is no sentinel distinguishing it from the
    /// real equator/prime-meridian point.
    pub latitude: f64,
    pub longitude: f64,
    pub contact_info: String,
}

fn string_field(id: &str, doc: &DocumentFields, name: &str) -> Result<String> {
    match doc.get(name) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(AppError::MalformedRecord(
            id.to_string(),
            format!("field `{name}` is not a string: {other}"),
        )),
    }
}

fn number_field(id: &str, doc: &DocumentFields, name: &str) -> Result<f64> {
    match doc.get(name) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
        Some(other) => Err(AppError::MalformedRecord(
            id.to_string(),
            format!("field `{name}` is not a number: {other}"),
        )),
    }
}

impl LostItemRecord {
    /// Parses a stored document. Missing display fields default to empty
    /// strings and a missing status reads as `Lost`; a present field of the
    /// wrong type fails with `MalformedRecord` so stream processing can drop
    /// the one bad document instead of the whole snapshot.
    pub fn from_document(id: &str, doc: &DocumentFields) -> Result<Self> {
        let status = match doc.get(field::STATUS) {
            None | Some(Value::Null) => ItemStatus::Lost,
            Some(Value::String(s)) => ItemStatus::parse(s),
            Some(other) => {
                return Err(AppError::MalformedRecord(
                    id.to_string(),
                    format!("field `status` is not a string: {other}"),
                ))
            }
        };

        let contact_info = match doc.get(field::CONTACT_INFO) {
            // Older record revisions omit contactInfo entirely.
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(AppError::MalformedRecord(
                    id.to_string(),
                    format!("field `contactInfo` is not a string: {other}"),
                ))
            }
        };

        Ok(Self {
            id: id.to_string(),
            owner_id: string_field(id, doc, field::OWNER_ID)?,
            item_name: string_field(id, doc, field::ITEM_NAME)?,
            location: string_field(id, doc, field::LOCATION)?,
            description: string_field(id, doc, field::DESCRIPTION)?,
            additional_info: string_field(id, doc, field::ADDITIONAL_INFO)?,
            city: string_field(id, doc, field::CITY)?,
            state: string_field(id, doc, field::STATE)?,
            status,
            date_posted: PostedDate::from_field(doc.get(field::DATE_POSTED)),
            user_name: string_field(id, doc, field::USER_NAME)?,
            image_url: string_field(id, doc, field::IMAGE_URL)?,
            storage_path: string_field(id, doc, field::STORAGE_PATH)?,
            latitude: number_field(id, doc, field::LATITUDE)?,
            longitude: number_field(id, doc, field::LONGITUDE)?,
            contact_info,
        })
    }

    /// Serializes to the wire shape. The id stays out of the document body.
    pub fn to_document(&self) -> DocumentFields {
        let mut doc = DocumentFields::new();
        doc.insert(field::OWNER_ID.into(), Value::from(self.owner_id.clone()));
        doc.insert(field::ITEM_NAME.into(), Value::from(self.item_name.clone()));
        doc.insert(field::LOCATION.into(), Value::from(self.location.clone()));
        doc.insert(field::DESCRIPTION.into(), Value::from(self.description.clone()));
        doc.insert(field::ADDITIONAL_INFO.into(), Value::from(self.additional_info.clone()));
        doc.insert(field::CITY.into(), Value::from(self.city.clone()));
        doc.insert(field::STATE.into(), Value::from(self.state.clone()));
        doc.insert(field::STATUS.into(), Value::from(self.status.as_str()));
        if let Some(date) = self.date_posted.to_field() {
            doc.insert(field::DATE_POSTED.into(), date);
        }
        doc.insert(field::USER_NAME.into(), Value::from(self.user_name.clone()));
        doc.insert(field::IMAGE_URL.into(), Value::from(self.image_url.clone()));
        doc.insert(field::STORAGE_PATH.into(), Value::from(self.storage_path.clone()));
        doc.insert(field::LATITUDE.into(), Value::from(self.latitude));
        doc.insert(field::LONGITUDE.into(), Value::from(self.longitude));
        doc.insert(field::CONTACT_INFO.into(), Value::from(self.contact_info.clone()));
        doc
    }
}

/// User-entered fields of a new report, before the system stamps identity,
/// status, and posting time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLostItem {
    pub item_name: String,
    pub location: String,
    pub description: String,
    pub additional_info: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub contact_info: String,
}

/// The signed-in identity as reported by the Authentication Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A photo payload handed over by the device camera or gallery.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub data: bytes::Bytes,
    pub content_type: mime::Mime,
}

impl PhotoUpload {
    pub fn jpeg(data: bytes::Bytes) -> Self {
        Self { data, content_type: mime::IMAGE_JPEG }
    }
}
