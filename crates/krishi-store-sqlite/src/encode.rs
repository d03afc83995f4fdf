//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO dates,
//! UUIDs as hyphenated lowercase strings, enums as their wire names, and
//! embedded lists as compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use krishi_core::{
  Error, Result,
  application::{ApplicationDocument, SchemeApplication, StatusChange},
  executive::{Executive, SmsLogEntry},
  farmer::{Farmer, FieldPhoto, GeoPoint},
  field_status::FieldStatus,
  principal::Admin,
  request::{Request, RequestComment},
  scheme::GovernmentScheme,
  settings::{NotificationTemplate, Settings},
};
use uuid::Uuid;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

// ─── Embedded lists ──────────────────────────────────────────────────────────

pub fn encode_string_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_templates(templates: &[NotificationTemplate]) -> Result<String> {
  Ok(serde_json::to_string(templates)?)
}

pub fn decode_templates(s: &str) -> Result<Vec<NotificationTemplate>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `admins` row.
pub struct RawAdmin {
  pub admin_id:      String,
  pub username:      String,
  pub name:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAdmin {
  pub fn into_admin(self) -> Result<Admin> {
    Ok(Admin {
      admin_id:      decode_uuid(&self.admin_id)?,
      username:      self.username,
      name:          self.name,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from an `executives` row, plus the derived assignment
/// list filled in by the loader.
pub struct RawExecutive {
  pub executive_id:     String,
  pub name:             String,
  pub email:            String,
  pub mobile:           Option<String>,
  pub region:           Option<String>,
  pub password_hash:    String,
  pub created_at:       String,
  pub assigned_farmers: Vec<String>,
}

impl RawExecutive {
  pub fn into_executive(self) -> Result<Executive> {
    Ok(Executive {
      executive_id:     decode_uuid(&self.executive_id)?,
      name:             self.name,
      email:            self.email,
      mobile:           self.mobile,
      region:           self.region,
      assigned_farmers: self
        .assigned_farmers
        .iter()
        .map(|id| decode_uuid(id))
        .collect::<Result<_>>()?,
      password_hash:    self.password_hash,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `farmers` row, plus the bookmark list filled in
/// by the loader.
pub struct RawFarmer {
  pub farmer_id:          String,
  pub name:               String,
  pub mobile:             String,
  pub village:            Option<String>,
  pub panchayat:          Option<String>,
  pub caste:              Option<String>,
  pub gender:             Option<String>,
  pub income:             Option<i64>,
  pub estimated_income:   Option<i64>,
  pub credit_score:       Option<u32>,
  pub crops:              String,
  pub assigned_executive: Option<String>,
  pub password_hash:      String,
  pub created_at:         String,
  pub saved_schemes:      Vec<String>,
}

impl RawFarmer {
  pub fn into_farmer(self) -> Result<Farmer> {
    Ok(Farmer {
      farmer_id:          decode_uuid(&self.farmer_id)?,
      name:               self.name,
      mobile:             self.mobile,
      village:            self.village,
      panchayat:          self.panchayat,
      caste:              self.caste,
      gender:             self.gender.as_deref().map(str::parse).transpose()?,
      income:             self.income,
      estimated_income:   self.estimated_income,
      credit_score:       self.credit_score,
      crops:              decode_string_list(&self.crops)?,
      assigned_executive: self
        .assigned_executive
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      saved_schemes:      self
        .saved_schemes
        .iter()
        .map(|id| decode_uuid(id))
        .collect::<Result<_>>()?,
      password_hash:      self.password_hash,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `field_photos` row.
pub struct RawFieldPhoto {
  pub photo_id:     String,
  pub farmer_id:    String,
  pub path:         String,
  pub content_hash: String,
  pub media_type:   String,
  pub uploaded_by:  String,
  pub latitude:     Option<f64>,
  pub longitude:    Option<f64>,
  pub uploaded_at:  String,
}

impl RawFieldPhoto {
  pub fn into_photo(self) -> Result<FieldPhoto> {
    let location = match (self.latitude, self.longitude) {
      (Some(latitude), Some(longitude)) => {
        Some(GeoPoint { latitude, longitude })
      }
      _ => None,
    };
    Ok(FieldPhoto {
      photo_id:     decode_uuid(&self.photo_id)?,
      farmer_id:    decode_uuid(&self.farmer_id)?,
      path:         self.path,
      content_hash: self.content_hash,
      media_type:   self.media_type,
      uploaded_by:  self.uploaded_by.parse()?,
      location,
      uploaded_at:  decode_dt(&self.uploaded_at)?,
    })
  }
}

/// Raw values read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:         String,
  pub farmer_id:          String,
  pub assigned_executive: Option<String>,
  pub title:              String,
  pub description:        String,
  pub category:           Option<String>,
  pub priority:           String,
  pub status:             String,
  pub created_at:         String,
  pub resolved_at:        Option<String>,
}

impl RawRequest {
  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      request_id:         decode_uuid(&self.request_id)?,
      farmer_id:          decode_uuid(&self.farmer_id)?,
      assigned_executive: self
        .assigned_executive
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      title:              self.title,
      description:        self.description,
      category:           self.category,
      priority:           self.priority.parse()?,
      status:             self.status.parse()?,
      created_at:         decode_dt(&self.created_at)?,
      resolved_at:        self.resolved_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `request_comments` row.
pub struct RawComment {
  pub comment_id:  String,
  pub request_id:  String,
  pub author_role: String,
  pub author_id:   String,
  pub body:        String,
  pub posted_at:   String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<RequestComment> {
    Ok(RequestComment {
      comment_id:  decode_uuid(&self.comment_id)?,
      request_id:  decode_uuid(&self.request_id)?,
      author_role: self.author_role.parse()?,
      author_id:   decode_uuid(&self.author_id)?,
      body:        self.body,
      posted_at:   decode_dt(&self.posted_at)?,
    })
  }
}

/// Raw values read directly from a `schemes` row.
pub struct RawScheme {
  pub scheme_id:            String,
  pub title:                String,
  pub category:             Option<String>,
  pub description:          String,
  pub eligibility:          String,
  pub benefits:             String,
  pub application_process:  String,
  pub required_documents:   String,
  pub application_deadline: Option<String>,
  pub contact_info:         Option<String>,
  pub status:               String,
  pub relevance:            String,
  pub created_at:           String,
}

impl RawScheme {
  pub fn into_scheme(self) -> Result<GovernmentScheme> {
    Ok(GovernmentScheme {
      scheme_id:            decode_uuid(&self.scheme_id)?,
      title:                self.title,
      category:             self.category,
      description:          self.description,
      eligibility:          decode_string_list(&self.eligibility)?,
      benefits:             decode_string_list(&self.benefits)?,
      application_process:  decode_string_list(&self.application_process)?,
      required_documents:   decode_string_list(&self.required_documents)?,
      application_deadline: self
        .application_deadline
        .as_deref()
        .map(decode_date)
        .transpose()?,
      contact_info:         self.contact_info,
      status:               self.status.parse()?,
      relevance:            self.relevance.parse()?,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `scheme_applications` row.
pub struct RawApplication {
  pub application_id: String,
  pub reference:      String,
  pub farmer_id:      String,
  pub scheme_id:      String,
  pub status:         String,
  pub reviewed_by:    Option<String>,
  pub review_date:    Option<String>,
  pub submitted_at:   String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<SchemeApplication> {
    Ok(SchemeApplication {
      application_id: decode_uuid(&self.application_id)?,
      reference:      self.reference,
      farmer_id:      decode_uuid(&self.farmer_id)?,
      scheme_id:      decode_uuid(&self.scheme_id)?,
      status:         self.status.parse()?,
      reviewed_by:    self.reviewed_by.as_deref().map(decode_uuid).transpose()?,
      review_date:    self.review_date.as_deref().map(decode_dt).transpose()?,
      submitted_at:   decode_dt(&self.submitted_at)?,
    })
  }
}

/// Raw values read directly from an `application_history` row.
pub struct RawStatusChange {
  pub status:     String,
  pub remarks:    Option<String>,
  pub actor_role: String,
  pub actor_id:   String,
  pub changed_at: String,
}

impl RawStatusChange {
  pub fn into_status_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      status:     self.status.parse()?,
      remarks:    self.remarks,
      actor_role: self.actor_role.parse()?,
      actor_id:   decode_uuid(&self.actor_id)?,
      changed_at: decode_dt(&self.changed_at)?,
    })
  }
}

/// Raw values read directly from an `application_documents` row.
pub struct RawDocument {
  pub document_id: String,
  pub name:        String,
  pub verified:    bool,
}

impl RawDocument {
  pub fn into_document(self) -> Result<ApplicationDocument> {
    Ok(ApplicationDocument {
      document_id: decode_uuid(&self.document_id)?,
      name:        self.name,
      verified:    self.verified,
    })
  }
}

/// Raw values read directly from a `field_statuses` row.
pub struct RawFieldStatus {
  pub farmer_id:  String,
  pub health:     String,
  pub notes:      Option<String>,
  pub updated_at: String,
}

impl RawFieldStatus {
  pub fn into_field_status(self) -> Result<FieldStatus> {
    Ok(FieldStatus {
      farmer_id:  decode_uuid(&self.farmer_id)?,
      health:     self.health.parse()?,
      notes:      self.notes,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `sms_log` row.
pub struct RawSmsEntry {
  pub entry_id:     String,
  pub executive_id: String,
  pub message:      String,
  pub recipients:   String,
  pub sent:         u32,
  pub failed:       u32,
  pub simulated:    bool,
  pub sent_at:      String,
}

impl RawSmsEntry {
  pub fn into_entry(self) -> Result<SmsLogEntry> {
    Ok(SmsLogEntry {
      entry_id:     decode_uuid(&self.entry_id)?,
      executive_id: decode_uuid(&self.executive_id)?,
      message:      self.message,
      recipients:   decode_string_list(&self.recipients)?,
      sent:         self.sent,
      failed:       self.failed,
      simulated:    self.simulated,
      sent_at:      decode_dt(&self.sent_at)?,
    })
  }
}

/// Raw values read directly from the `settings` row.
pub struct RawSettings {
  pub notification_templates: String,
  pub sms_enabled:            bool,
  pub maintenance_mode:       bool,
  pub updated_at:             String,
}

impl RawSettings {
  pub fn into_settings(self) -> Result<Settings> {
    Ok(Settings {
      notification_templates: decode_templates(&self.notification_templates)?,
      sms_enabled:            self.sms_enabled,
      maintenance_mode:       self.maintenance_mode,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}
