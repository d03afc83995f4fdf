//! [`SqliteStore`] — the SQLite implementation of [`PortalStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use krishi_core::{
  Error, Result,
  analytics::{ApplicationStats, FarmerStats, GroupCount, RequestStats, SchemeStats},
  application::{
    ApplicationDetail, ApplicationDocument, ApplicationStatus,
    DocumentVerification, NewApplication, SchemeApplication, StatusChange,
  },
  executive::{Executive, ExecutiveUpdate, NewExecutive, NewSmsLogEntry, SmsLogEntry},
  farmer::{Farmer, FarmerUpdate, FieldPhoto, NewFarmer, NewFieldPhoto},
  field_status::{FieldHealth, FieldStatus},
  principal::{Admin, NewAdmin, Principal},
  request::{
    NewRequest, Request, RequestComment, RequestDetail, RequestStatus,
    RequestUpdate,
  },
  role::{Actor, Role},
  scheme::{GovernmentScheme, NewScheme, SchemeStatus, SchemeUpdate},
  settings::{Settings, SettingsUpdate},
  store::PortalStore,
};

use crate::{
  encode::{
    RawAdmin, RawApplication, RawComment, RawDocument, RawExecutive, RawFarmer,
    RawFieldPhoto, RawFieldStatus, RawRequest, RawScheme, RawSettings,
    RawSmsEntry, RawStatusChange, encode_date, encode_dt, encode_string_list,
    encode_templates, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portal store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(unwrap_db_error)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(unwrap_db_error)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run a closure on the connection thread, translating database failures
  /// into [`Error::Storage`] and unwrapping smuggled domain errors.
  async fn call<F, T>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T>
      + Send
      + 'static,
    T: Send + 'static,
  {
    self.conn.call(f).await.map_err(unwrap_db_error)
  }
}

/// Wrap a domain error for transport out of a connection closure.
fn domain(err: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(err))
}

/// Recover domain errors smuggled through [`tokio_rusqlite::Error::Other`];
/// everything else is a storage fault.
fn unwrap_db_error(err: tokio_rusqlite::Error) -> Error {
  match err {
    tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
      Ok(domain) => *domain,
      Err(other) => Error::Storage(other.to_string()),
    },
    other => Error::Storage(other.to_string()),
  }
}

// ─── PortalStore impl ────────────────────────────────────────────────────────

impl PortalStore for SqliteStore {
  // ── Principals ────────────────────────────────────────────────────────────

  async fn find_principal(
    &self,
    role: Role,
    identifier: String,
  ) -> Result<Option<Principal>> {
    match role {
      Role::Admin => {
        let raw = self
          .call(move |conn| Ok(load_admin_by(conn, "username", &identifier)?))
          .await?;
        Ok(raw.map(RawAdmin::into_admin).transpose()?.map(Principal::Admin))
      }
      Role::Executive => {
        let raw = self
          .call(move |conn| Ok(load_executive_by(conn, "email", &identifier)?))
          .await?;
        Ok(
          raw
            .map(RawExecutive::into_executive)
            .transpose()?
            .map(Principal::Executive),
        )
      }
      Role::Farmer => {
        let raw = self
          .call(move |conn| Ok(load_farmer_by(conn, "mobile", &identifier)?))
          .await?;
        Ok(
          raw
            .map(RawFarmer::into_farmer)
            .transpose()?
            .map(Principal::Farmer),
        )
      }
    }
  }

  async fn get_principal(&self, role: Role, id: Uuid) -> Result<Option<Principal>> {
    let key = encode_uuid(id);
    match role {
      Role::Admin => {
        let raw = self
          .call(move |conn| Ok(load_admin_by(conn, "admin_id", &key)?))
          .await?;
        Ok(raw.map(RawAdmin::into_admin).transpose()?.map(Principal::Admin))
      }
      Role::Executive => {
        let raw = self
          .call(move |conn| Ok(load_executive_by(conn, "executive_id", &key)?))
          .await?;
        Ok(
          raw
            .map(RawExecutive::into_executive)
            .transpose()?
            .map(Principal::Executive),
        )
      }
      Role::Farmer => {
        let raw = self
          .call(move |conn| Ok(load_farmer_by(conn, "farmer_id", &key)?))
          .await?;
        Ok(
          raw
            .map(RawFarmer::into_farmer)
            .transpose()?
            .map(Principal::Farmer),
        )
      }
    }
  }

  // ── Admins ────────────────────────────────────────────────────────────────

  async fn create_admin(&self, input: NewAdmin) -> Result<Admin> {
    let admin = Admin {
      admin_id:      Uuid::new_v4(),
      username:      input.username,
      name:          input.name,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if row_exists(&tx, "SELECT 1 FROM admins WHERE username = ?1", &admin.username)? {
          return Err(domain(Error::Duplicate {
            field: "username",
            value: admin.username,
          }));
        }
        insert_admin(&tx, &admin)?;
        tx.commit()?;
        Ok(admin)
      })
      .await
  }

  async fn ensure_admin(&self, input: NewAdmin) -> Result<Option<Admin>> {
    let admin = Admin {
      admin_id:      Uuid::new_v4(),
      username:      input.username,
      name:          input.name,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if row_exists(&tx, "SELECT 1 FROM admins WHERE username = ?1", &admin.username)? {
          return Ok(None);
        }
        insert_admin(&tx, &admin)?;
        tx.commit()?;
        Ok(Some(admin))
      })
      .await
  }

  // ── Executives ────────────────────────────────────────────────────────────

  async fn create_executive(&self, input: NewExecutive) -> Result<Executive> {
    let executive = Executive {
      executive_id:     Uuid::new_v4(),
      name:             input.name,
      email:            input.email,
      mobile:           input.mobile,
      region:           input.region,
      assigned_farmers: Vec::new(),
      password_hash:    input.password_hash,
      created_at:       Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if row_exists(&tx, "SELECT 1 FROM executives WHERE email = ?1", &executive.email)? {
          return Err(domain(Error::Duplicate {
            field: "email",
            value: executive.email,
          }));
        }
        tx.execute(
          "INSERT INTO executives (executive_id, name, email, mobile, region, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(executive.executive_id),
            executive.name,
            executive.email,
            executive.mobile,
            executive.region,
            executive.password_hash,
            encode_dt(executive.created_at),
          ],
        )?;
        tx.commit()?;
        Ok(executive)
      })
      .await
  }

  async fn get_executive(&self, id: Uuid) -> Result<Option<Executive>> {
    let key = encode_uuid(id);
    let raw = self
      .call(move |conn| Ok(load_executive_by(conn, "executive_id", &key)?))
      .await?;
    raw.map(RawExecutive::into_executive).transpose()
  }

  async fn list_executives(&self) -> Result<Vec<Executive>> {
    let raws = self
      .call(move |conn| {
        let mut raws = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {EXECUTIVE_COLS} FROM executives ORDER BY created_at DESC, executive_id"
          ))?;
          stmt
            .query_map([], map_executive)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for raw in &mut raws {
          raw.assigned_farmers = assigned_farmer_ids(conn, &raw.executive_id)?;
        }
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawExecutive::into_executive).collect()
  }

  async fn update_executive(
    &self,
    id: Uuid,
    update: ExecutiveUpdate,
  ) -> Result<Executive> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_executive_by(&tx, "executive_id", &key)? else {
          return Err(domain(Error::ExecutiveNotFound(id)));
        };
        let mut executive = raw.into_executive().map_err(domain)?;
        if let Some(name) = update.name {
          executive.name = name;
        }
        if let Some(mobile) = update.mobile {
          executive.mobile = Some(mobile);
        }
        if let Some(region) = update.region {
          executive.region = Some(region);
        }
        tx.execute(
          "UPDATE executives SET name = ?1, mobile = ?2, region = ?3 WHERE executive_id = ?4",
          rusqlite::params![executive.name, executive.mobile, executive.region, key],
        )?;
        tx.commit()?;
        Ok(executive)
      })
      .await
  }

  async fn delete_executive(&self, id: Uuid) -> Result<()> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM executives WHERE executive_id = ?1", &key)? {
          return Err(domain(Error::ExecutiveNotFound(id)));
        }
        let farmers: i64 = tx.query_row(
          "SELECT COUNT(*) FROM farmers WHERE assigned_executive = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )?;
        if farmers > 0 {
          return Err(domain(Error::ExecutiveHasFarmers {
            id,
            farmers: farmers as u64,
          }));
        }
        // Claimed requests fall back to unassigned via ON DELETE SET NULL;
        // the SMS log cascades away with the account.
        tx.execute(
          "DELETE FROM executives WHERE executive_id = ?1",
          rusqlite::params![key],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn append_sms_log(&self, input: NewSmsLogEntry) -> Result<SmsLogEntry> {
    let entry = SmsLogEntry {
      entry_id:     Uuid::new_v4(),
      executive_id: input.executive_id,
      message:      input.message,
      recipients:   input.recipients,
      sent:         input.sent,
      failed:       input.failed,
      simulated:    input.simulated,
      sent_at:      Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let key = encode_uuid(entry.executive_id);
        if !row_exists(&tx, "SELECT 1 FROM executives WHERE executive_id = ?1", &key)? {
          return Err(domain(Error::ExecutiveNotFound(entry.executive_id)));
        }
        tx.execute(
          "INSERT INTO sms_log (entry_id, executive_id, message, recipients, sent, failed, simulated, sent_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(entry.entry_id),
            key,
            entry.message,
            encode_string_list(&entry.recipients).map_err(domain)?,
            entry.sent,
            entry.failed,
            entry.simulated,
            encode_dt(entry.sent_at),
          ],
        )?;
        tx.commit()?;
        Ok(entry)
      })
      .await
  }

  async fn list_sms_log(&self, executive_id: Uuid) -> Result<Vec<SmsLogEntry>> {
    let key = encode_uuid(executive_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, executive_id, message, recipients, sent, failed, simulated, sent_at
           FROM sms_log WHERE executive_id = ?1 ORDER BY sent_at DESC, entry_id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![key], |row| {
            Ok(RawSmsEntry {
              entry_id:     row.get(0)?,
              executive_id: row.get(1)?,
              message:      row.get(2)?,
              recipients:   row.get(3)?,
              sent:         row.get(4)?,
              failed:       row.get(5)?,
              simulated:    row.get(6)?,
              sent_at:      row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawSmsEntry::into_entry).collect()
  }

  // ── Farmers ───────────────────────────────────────────────────────────────

  async fn create_farmer(&self, input: NewFarmer) -> Result<Farmer> {
    let farmer = Farmer {
      farmer_id:          Uuid::new_v4(),
      name:               input.name,
      mobile:             input.mobile,
      village:            input.village,
      panchayat:          input.panchayat,
      caste:              input.caste,
      gender:             input.gender,
      income:             input.income,
      estimated_income:   input.estimated_income,
      credit_score:       input.credit_score,
      crops:              input.crops,
      assigned_executive: input.assigned_executive,
      saved_schemes:      Vec::new(),
      password_hash:      input.password_hash,
      created_at:         Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if row_exists(&tx, "SELECT 1 FROM farmers WHERE mobile = ?1", &farmer.mobile)? {
          return Err(domain(Error::Duplicate {
            field: "mobile",
            value: farmer.mobile,
          }));
        }
        if let Some(executive_id) = farmer.assigned_executive {
          let exec_key = encode_uuid(executive_id);
          if !row_exists(&tx, "SELECT 1 FROM executives WHERE executive_id = ?1", &exec_key)? {
            return Err(domain(Error::ExecutiveNotFound(executive_id)));
          }
        }
        tx.execute(
          "INSERT INTO farmers (farmer_id, name, mobile, village, panchayat, caste, gender,
             income, estimated_income, credit_score, crops, assigned_executive, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            encode_uuid(farmer.farmer_id),
            farmer.name,
            farmer.mobile,
            farmer.village,
            farmer.panchayat,
            farmer.caste,
            farmer.gender.map(|g| g.as_str()),
            farmer.income,
            farmer.estimated_income,
            farmer.credit_score,
            encode_string_list(&farmer.crops).map_err(domain)?,
            farmer.assigned_executive.map(encode_uuid),
            farmer.password_hash,
            encode_dt(farmer.created_at),
          ],
        )?;
        tx.commit()?;
        Ok(farmer)
      })
      .await
  }

  async fn get_farmer(&self, id: Uuid) -> Result<Option<Farmer>> {
    let key = encode_uuid(id);
    let raw = self
      .call(move |conn| Ok(load_farmer_by(conn, "farmer_id", &key)?))
      .await?;
    raw.map(RawFarmer::into_farmer).transpose()
  }

  async fn list_farmers(&self) -> Result<Vec<Farmer>> {
    let raws = self
      .call(move |conn| {
        let mut raws = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {FARMER_COLS} FROM farmers ORDER BY created_at DESC, farmer_id"
          ))?;
          stmt
            .query_map([], map_farmer)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for raw in &mut raws {
          raw.saved_schemes = saved_scheme_ids(conn, &raw.farmer_id)?;
        }
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawFarmer::into_farmer).collect()
  }

  async fn list_farmers_for_executive(
    &self,
    executive_id: Uuid,
  ) -> Result<Vec<Farmer>> {
    let key = encode_uuid(executive_id);
    let raws = self
      .call(move |conn| {
        let mut raws = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {FARMER_COLS} FROM farmers WHERE assigned_executive = ?1
             ORDER BY created_at DESC, farmer_id"
          ))?;
          stmt
            .query_map(rusqlite::params![key], map_farmer)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for raw in &mut raws {
          raw.saved_schemes = saved_scheme_ids(conn, &raw.farmer_id)?;
        }
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawFarmer::into_farmer).collect()
  }

  async fn update_farmer(&self, id: Uuid, update: FarmerUpdate) -> Result<Farmer> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_farmer_by(&tx, "farmer_id", &key)? else {
          return Err(domain(Error::FarmerNotFound(id)));
        };
        let mut farmer = raw.into_farmer().map_err(domain)?;
        if let Some(name) = update.name {
          farmer.name = name;
        }
        if let Some(village) = update.village {
          farmer.village = Some(village);
        }
        if let Some(panchayat) = update.panchayat {
          farmer.panchayat = Some(panchayat);
        }
        if let Some(caste) = update.caste {
          farmer.caste = Some(caste);
        }
        if let Some(gender) = update.gender {
          farmer.gender = Some(gender);
        }
        if let Some(income) = update.income {
          farmer.income = Some(income);
        }
        if let Some(estimated) = update.estimated_income {
          farmer.estimated_income = Some(estimated);
        }
        if let Some(score) = update.credit_score {
          farmer.credit_score = Some(score);
        }
        if let Some(crops) = update.crops {
          farmer.crops = crops;
        }
        tx.execute(
          "UPDATE farmers SET name = ?1, village = ?2, panchayat = ?3, caste = ?4, gender = ?5,
             income = ?6, estimated_income = ?7, credit_score = ?8, crops = ?9
           WHERE farmer_id = ?10",
          rusqlite::params![
            farmer.name,
            farmer.village,
            farmer.panchayat,
            farmer.caste,
            farmer.gender.map(|g| g.as_str()),
            farmer.income,
            farmer.estimated_income,
            farmer.credit_score,
            encode_string_list(&farmer.crops).map_err(domain)?,
            key,
          ],
        )?;
        tx.commit()?;
        Ok(farmer)
      })
      .await
  }

  async fn delete_farmer(&self, id: Uuid) -> Result<()> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &key)? {
          return Err(domain(Error::FarmerNotFound(id)));
        }
        // Requests (with comments), applications (with history and
        // documents), field status, photos, and bookmarks all cascade.
        tx.execute("DELETE FROM farmers WHERE farmer_id = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn assign_farmer(
    &self,
    farmer_id: Uuid,
    executive_id: Uuid,
  ) -> Result<Farmer> {
    let farmer_key = encode_uuid(farmer_id);
    let exec_key = encode_uuid(executive_id);
    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        }
        if !row_exists(&tx, "SELECT 1 FROM executives WHERE executive_id = ?1", &exec_key)? {
          return Err(domain(Error::ExecutiveNotFound(executive_id)));
        }
        tx.execute(
          "UPDATE farmers SET assigned_executive = ?1 WHERE farmer_id = ?2",
          rusqlite::params![exec_key, farmer_key],
        )?;
        let Some(raw) = load_farmer_by(&tx, "farmer_id", &farmer_key)? else {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        };
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw.into_farmer()
  }

  async fn unassign_farmer(
    &self,
    farmer_id: Uuid,
    executive_id: Uuid,
  ) -> Result<Farmer> {
    let farmer_key = encode_uuid(farmer_id);
    let exec_key = encode_uuid(executive_id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_farmer_by(&tx, "farmer_id", &farmer_key)? else {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        };
        if raw.assigned_executive.as_deref() != Some(exec_key.as_str()) {
          return Err(domain(Error::FarmerNotAssigned {
            farmer:    farmer_id,
            executive: executive_id,
          }));
        }
        tx.execute(
          "UPDATE farmers SET assigned_executive = NULL WHERE farmer_id = ?1",
          rusqlite::params![farmer_key],
        )?;
        tx.commit()?;
        let mut farmer = raw.into_farmer().map_err(domain)?;
        farmer.assigned_executive = None;
        Ok(farmer)
      })
      .await
  }

  async fn save_scheme(&self, farmer_id: Uuid, scheme_id: Uuid) -> Result<Farmer> {
    let farmer_key = encode_uuid(farmer_id);
    let scheme_key = encode_uuid(scheme_id);
    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        }
        if !row_exists(&tx, "SELECT 1 FROM schemes WHERE scheme_id = ?1", &scheme_key)? {
          return Err(domain(Error::SchemeNotFound(scheme_id)));
        }
        tx.execute(
          "INSERT OR IGNORE INTO saved_schemes (farmer_id, scheme_id, saved_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![farmer_key, scheme_key, encode_dt(Utc::now())],
        )?;
        let Some(raw) = load_farmer_by(&tx, "farmer_id", &farmer_key)? else {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        };
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw.into_farmer()
  }

  async fn unsave_scheme(&self, farmer_id: Uuid, scheme_id: Uuid) -> Result<Farmer> {
    let farmer_key = encode_uuid(farmer_id);
    let scheme_key = encode_uuid(scheme_id);
    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        }
        tx.execute(
          "DELETE FROM saved_schemes WHERE farmer_id = ?1 AND scheme_id = ?2",
          rusqlite::params![farmer_key, scheme_key],
        )?;
        let Some(raw) = load_farmer_by(&tx, "farmer_id", &farmer_key)? else {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        };
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw.into_farmer()
  }

  async fn add_field_photo(&self, input: NewFieldPhoto) -> Result<FieldPhoto> {
    let photo = FieldPhoto {
      photo_id:     Uuid::new_v4(),
      farmer_id:    input.farmer_id,
      path:         input.path,
      content_hash: input.content_hash,
      media_type:   input.media_type,
      uploaded_by:  input.uploaded_by,
      location:     input.location,
      uploaded_at:  Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let farmer_key = encode_uuid(photo.farmer_id);
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(photo.farmer_id)));
        }
        tx.execute(
          "INSERT INTO field_photos (photo_id, farmer_id, path, content_hash, media_type,
             uploaded_by, latitude, longitude, uploaded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            encode_uuid(photo.photo_id),
            farmer_key,
            photo.path,
            photo.content_hash,
            photo.media_type,
            photo.uploaded_by.as_str(),
            photo.location.map(|l| l.latitude),
            photo.location.map(|l| l.longitude),
            encode_dt(photo.uploaded_at),
          ],
        )?;
        tx.commit()?;
        Ok(photo)
      })
      .await
  }

  async fn list_field_photos(&self, farmer_id: Uuid) -> Result<Vec<FieldPhoto>> {
    let key = encode_uuid(farmer_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT photo_id, farmer_id, path, content_hash, media_type, uploaded_by,
             latitude, longitude, uploaded_at
           FROM field_photos WHERE farmer_id = ?1 ORDER BY uploaded_at DESC, photo_id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![key], |row| {
            Ok(RawFieldPhoto {
              photo_id:     row.get(0)?,
              farmer_id:    row.get(1)?,
              path:         row.get(2)?,
              content_hash: row.get(3)?,
              media_type:   row.get(4)?,
              uploaded_by:  row.get(5)?,
              latitude:     row.get(6)?,
              longitude:    row.get(7)?,
              uploaded_at:  row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawFieldPhoto::into_photo).collect()
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn create_request(&self, input: NewRequest) -> Result<Request> {
    let request = Request {
      request_id:         Uuid::new_v4(),
      farmer_id:          input.farmer_id,
      assigned_executive: None,
      title:              input.title,
      description:        input.description,
      category:           input.category,
      priority:           input.priority,
      status:             RequestStatus::Pending,
      created_at:         Utc::now(),
      resolved_at:        None,
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let farmer_key = encode_uuid(request.farmer_id);
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(request.farmer_id)));
        }
        tx.execute(
          "INSERT INTO requests (request_id, farmer_id, assigned_executive, title, description,
             category, priority, status, created_at, resolved_at)
           VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
          rusqlite::params![
            encode_uuid(request.request_id),
            farmer_key,
            request.title,
            request.description,
            request.category,
            request.priority.as_str(),
            request.status.as_str(),
            encode_dt(request.created_at),
          ],
        )?;
        tx.commit()?;
        Ok(request)
      })
      .await
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<RequestDetail>> {
    let key = encode_uuid(id);
    let bundle = self
      .call(move |conn| {
        let Some(raw) = load_request(conn, &key)? else {
          return Ok(None);
        };
        let comments = comment_rows(conn, &key)?;
        Ok(Some((raw, comments)))
      })
      .await?;
    let Some((raw, comments)) = bundle else {
      return Ok(None);
    };
    Ok(Some(RequestDetail {
      request:  raw.into_request()?,
      comments: comments
        .into_iter()
        .map(RawComment::into_comment)
        .collect::<Result<_>>()?,
    }))
  }

  async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<Request>> {
    let status_str = status.map(RequestStatus::as_str);
    let raws = self
      .call(move |conn| {
        let raws = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLS} FROM requests WHERE status = ?1
             ORDER BY created_at DESC, request_id"
          ))?;
          stmt
            .query_map(rusqlite::params![s], map_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLS} FROM requests ORDER BY created_at DESC, request_id"
          ))?;
          stmt
            .query_map([], map_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn list_requests_for_farmer(&self, farmer_id: Uuid) -> Result<Vec<Request>> {
    let key = encode_uuid(farmer_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLS} FROM requests WHERE farmer_id = ?1
           ORDER BY created_at DESC, request_id"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![key], map_request)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn list_requests_for_executive(
    &self,
    executive_id: Uuid,
  ) -> Result<Vec<Request>> {
    let key = encode_uuid(executive_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLS} FROM requests
           WHERE assigned_executive = ?1
              OR (assigned_executive IS NULL AND status = 'pending')
           ORDER BY created_at DESC, request_id"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![key], map_request)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn claim_request(
    &self,
    request_id: Uuid,
    executive_id: Uuid,
  ) -> Result<Request> {
    let key = encode_uuid(request_id);
    let exec_key = encode_uuid(executive_id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_request(&tx, &key)? else {
          return Err(domain(Error::RequestNotFound(request_id)));
        };
        let mut request = raw.into_request().map_err(domain)?;
        if request.assigned_executive.is_some() {
          return Err(domain(Error::RequestAlreadyClaimed(request_id)));
        }
        if request.status != RequestStatus::Pending {
          return Err(domain(Error::RequestNotClaimable {
            id:     request_id,
            status: request.status,
          }));
        }
        if !row_exists(&tx, "SELECT 1 FROM executives WHERE executive_id = ?1", &exec_key)? {
          return Err(domain(Error::ExecutiveNotFound(executive_id)));
        }
        tx.execute(
          "UPDATE requests SET assigned_executive = ?1, status = ?2 WHERE request_id = ?3",
          rusqlite::params![exec_key, RequestStatus::InProgress.as_str(), key],
        )?;
        tx.commit()?;
        request.assigned_executive = Some(executive_id);
        request.status = RequestStatus::InProgress;
        Ok(request)
      })
      .await
  }

  async fn transition_request(
    &self,
    request_id: Uuid,
    next: RequestStatus,
  ) -> Result<Request> {
    let key = encode_uuid(request_id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_request(&tx, &key)? else {
          return Err(domain(Error::RequestNotFound(request_id)));
        };
        let mut request = raw.into_request().map_err(domain)?;
        if !request.status.can_transition_to(next) {
          return Err(domain(Error::InvalidRequestTransition {
            from: request.status,
            to:   next,
          }));
        }
        request.status = next;
        if next == RequestStatus::Resolved && request.resolved_at.is_none() {
          request.resolved_at = Some(Utc::now());
        }
        tx.execute(
          "UPDATE requests SET status = ?1, resolved_at = ?2 WHERE request_id = ?3",
          rusqlite::params![
            next.as_str(),
            request.resolved_at.map(encode_dt),
            key
          ],
        )?;
        tx.commit()?;
        Ok(request)
      })
      .await
  }

  async fn update_request(
    &self,
    request_id: Uuid,
    update: RequestUpdate,
  ) -> Result<Request> {
    let key = encode_uuid(request_id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_request(&tx, &key)? else {
          return Err(domain(Error::RequestNotFound(request_id)));
        };
        let mut request = raw.into_request().map_err(domain)?;
        if request.status != RequestStatus::Pending {
          return Err(domain(Error::RequestNotEditable {
            id:     request_id,
            status: request.status,
          }));
        }
        if let Some(title) = update.title {
          request.title = title;
        }
        if let Some(description) = update.description {
          request.description = description;
        }
        if let Some(category) = update.category {
          request.category = Some(category);
        }
        if let Some(priority) = update.priority {
          request.priority = priority;
        }
        tx.execute(
          "UPDATE requests SET title = ?1, description = ?2, category = ?3, priority = ?4
           WHERE request_id = ?5",
          rusqlite::params![
            request.title,
            request.description,
            request.category,
            request.priority.as_str(),
            key
          ],
        )?;
        tx.commit()?;
        Ok(request)
      })
      .await
  }

  async fn add_request_comment(
    &self,
    request_id: Uuid,
    author: Actor,
    body: String,
  ) -> Result<RequestComment> {
    let comment = RequestComment {
      comment_id:  Uuid::new_v4(),
      request_id,
      author_role: author.role,
      author_id:   author.id,
      body,
      posted_at:   Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let key = encode_uuid(comment.request_id);
        if !row_exists(&tx, "SELECT 1 FROM requests WHERE request_id = ?1", &key)? {
          return Err(domain(Error::RequestNotFound(comment.request_id)));
        }
        tx.execute(
          "INSERT INTO request_comments (comment_id, request_id, author_role, author_id, body, posted_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(comment.comment_id),
            key,
            comment.author_role.as_str(),
            encode_uuid(comment.author_id),
            comment.body,
            encode_dt(comment.posted_at),
          ],
        )?;
        tx.commit()?;
        Ok(comment)
      })
      .await
  }

  // ── Schemes ───────────────────────────────────────────────────────────────

  async fn create_scheme(&self, input: NewScheme) -> Result<GovernmentScheme> {
    let scheme = GovernmentScheme {
      scheme_id:            Uuid::new_v4(),
      title:                input.title,
      category:             input.category,
      description:          input.description,
      eligibility:          input.eligibility,
      benefits:             input.benefits,
      application_process:  input.application_process,
      required_documents:   input.required_documents,
      application_deadline: input.application_deadline,
      contact_info:         input.contact_info,
      status:               input.status,
      relevance:            input.relevance,
      created_at:           Utc::now(),
    };

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schemes (scheme_id, title, category, description, eligibility, benefits,
             application_process, required_documents, application_deadline, contact_info,
             status, relevance, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            encode_uuid(scheme.scheme_id),
            scheme.title,
            scheme.category,
            scheme.description,
            encode_string_list(&scheme.eligibility).map_err(domain)?,
            encode_string_list(&scheme.benefits).map_err(domain)?,
            encode_string_list(&scheme.application_process).map_err(domain)?,
            encode_string_list(&scheme.required_documents).map_err(domain)?,
            scheme.application_deadline.map(encode_date),
            scheme.contact_info,
            scheme.status.as_str(),
            scheme.relevance.as_str(),
            encode_dt(scheme.created_at),
          ],
        )?;
        Ok(scheme)
      })
      .await
  }

  async fn get_scheme(&self, id: Uuid) -> Result<Option<GovernmentScheme>> {
    let key = encode_uuid(id);
    let raw = self
      .call(move |conn| Ok(load_scheme(conn, &key)?))
      .await?;
    raw.map(RawScheme::into_scheme).transpose()
  }

  async fn list_schemes(
    &self,
    status: Option<SchemeStatus>,
  ) -> Result<Vec<GovernmentScheme>> {
    let status_str = status.map(SchemeStatus::as_str);
    let raws = self
      .call(move |conn| {
        let raws = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEME_COLS} FROM schemes WHERE status = ?1
             ORDER BY created_at DESC, scheme_id"
          ))?;
          stmt
            .query_map(rusqlite::params![s], map_scheme)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEME_COLS} FROM schemes ORDER BY created_at DESC, scheme_id"
          ))?;
          stmt
            .query_map([], map_scheme)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawScheme::into_scheme).collect()
  }

  async fn update_scheme(
    &self,
    id: Uuid,
    update: SchemeUpdate,
  ) -> Result<GovernmentScheme> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_scheme(&tx, &key)? else {
          return Err(domain(Error::SchemeNotFound(id)));
        };
        let mut scheme = raw.into_scheme().map_err(domain)?;
        if let Some(title) = update.title {
          scheme.title = title;
        }
        if let Some(category) = update.category {
          scheme.category = Some(category);
        }
        if let Some(description) = update.description {
          scheme.description = description;
        }
        if let Some(eligibility) = update.eligibility {
          scheme.eligibility = eligibility;
        }
        if let Some(benefits) = update.benefits {
          scheme.benefits = benefits;
        }
        if let Some(process) = update.application_process {
          scheme.application_process = process;
        }
        if let Some(documents) = update.required_documents {
          scheme.required_documents = documents;
        }
        if let Some(deadline) = update.application_deadline {
          scheme.application_deadline = Some(deadline);
        }
        if let Some(contact) = update.contact_info {
          scheme.contact_info = Some(contact);
        }
        if let Some(status) = update.status {
          scheme.status = status;
        }
        if let Some(relevance) = update.relevance {
          scheme.relevance = relevance;
        }
        tx.execute(
          "UPDATE schemes SET title = ?1, category = ?2, description = ?3, eligibility = ?4,
             benefits = ?5, application_process = ?6, required_documents = ?7,
             application_deadline = ?8, contact_info = ?9, status = ?10, relevance = ?11
           WHERE scheme_id = ?12",
          rusqlite::params![
            scheme.title,
            scheme.category,
            scheme.description,
            encode_string_list(&scheme.eligibility).map_err(domain)?,
            encode_string_list(&scheme.benefits).map_err(domain)?,
            encode_string_list(&scheme.application_process).map_err(domain)?,
            encode_string_list(&scheme.required_documents).map_err(domain)?,
            scheme.application_deadline.map(encode_date),
            scheme.contact_info,
            scheme.status.as_str(),
            scheme.relevance.as_str(),
            key,
          ],
        )?;
        tx.commit()?;
        Ok(scheme)
      })
      .await
  }

  async fn delete_scheme(&self, id: Uuid) -> Result<()> {
    let key = encode_uuid(id);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM schemes WHERE scheme_id = ?1", &key)? {
          return Err(domain(Error::SchemeNotFound(id)));
        }
        let applications: i64 = tx.query_row(
          "SELECT COUNT(*) FROM scheme_applications WHERE scheme_id = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )?;
        if applications > 0 {
          return Err(domain(Error::SchemeInUse {
            id,
            applications: applications as u64,
          }));
        }
        // Bookmarks cascade with the scheme row.
        tx.execute("DELETE FROM schemes WHERE scheme_id = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  // ── Applications ──────────────────────────────────────────────────────────

  async fn create_application(
    &self,
    input: NewApplication,
  ) -> Result<ApplicationDetail> {
    let now = Utc::now();
    let application_id = Uuid::new_v4();
    let farmer_id = input.farmer_id;
    let scheme_id = input.scheme_id;
    let documents = input.documents;
    let app_key = encode_uuid(application_id);
    let farmer_key = encode_uuid(farmer_id);
    let scheme_key = encode_uuid(scheme_id);
    let day_prefix = format!("APP-{}-", now.format("%Y%m%d"));
    let submitted_str = encode_dt(now);

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &farmer_key)? {
          return Err(domain(Error::FarmerNotFound(farmer_id)));
        }
        if !row_exists(&tx, "SELECT 1 FROM schemes WHERE scheme_id = ?1", &scheme_key)? {
          return Err(domain(Error::SchemeNotFound(scheme_id)));
        }

        let live: i64 = tx.query_row(
          "SELECT COUNT(*) FROM scheme_applications
           WHERE farmer_id = ?1 AND scheme_id = ?2 AND status != 'rejected'",
          rusqlite::params![farmer_key, scheme_key],
          |row| row.get(0),
        )?;
        if live > 0 {
          return Err(domain(Error::DuplicateApplication {
            farmer: farmer_id,
            scheme: scheme_id,
          }));
        }

        // One above the highest sequence issued today, so references stay
        // unique even after same-day rows are cascade-deleted.
        let last: Option<String> = tx
          .query_row(
            "SELECT reference FROM scheme_applications WHERE reference LIKE ?1 || '%'
             ORDER BY reference DESC LIMIT 1",
            rusqlite::params![day_prefix],
            |row| row.get(0),
          )
          .optional()?;
        let sequence = last
          .as_deref()
          .and_then(|r| r.rsplit('-').next())
          .and_then(|n| n.parse::<u32>().ok())
          .unwrap_or(0)
          + 1;
        let reference = format!("{day_prefix}{sequence:04}");

        tx.execute(
          "INSERT INTO scheme_applications (application_id, reference, farmer_id, scheme_id,
             status, reviewed_by, review_date, submitted_at)
           VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, ?6)",
          rusqlite::params![
            app_key,
            reference,
            farmer_key,
            scheme_key,
            ApplicationStatus::Pending.as_str(),
            submitted_str,
          ],
        )?;

        let mut docs = Vec::with_capacity(documents.len());
        for (position, name) in documents.into_iter().enumerate() {
          let document_id = Uuid::new_v4();
          tx.execute(
            "INSERT INTO application_documents (document_id, application_id, name, verified, position)
             VALUES (?1, ?2, ?3, 0, ?4)",
            rusqlite::params![encode_uuid(document_id), app_key, name, position as i64],
          )?;
          docs.push(ApplicationDocument {
            document_id,
            name,
            verified: false,
          });
        }

        let opener = Actor::new(Role::Farmer, farmer_id);
        append_history(&tx, &app_key, ApplicationStatus::Pending, None, opener, now)?;
        tx.commit()?;

        Ok(ApplicationDetail {
          application: SchemeApplication {
            application_id,
            reference,
            farmer_id,
            scheme_id,
            status: ApplicationStatus::Pending,
            reviewed_by: None,
            review_date: None,
            submitted_at: now,
          },
          documents: docs,
          history: vec![StatusChange {
            status:     ApplicationStatus::Pending,
            remarks:    None,
            actor_role: Role::Farmer,
            actor_id:   farmer_id,
            changed_at: now,
          }],
        })
      })
      .await
  }

  async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
    let key = encode_uuid(id);
    let bundle = self
      .call(move |conn| {
        let Some(raw) = load_application(conn, &key)? else {
          return Ok(None);
        };
        let documents = document_rows(conn, &key)?;
        let history = history_rows(conn, &key)?;
        Ok(Some((raw, documents, history)))
      })
      .await?;
    let Some((raw, documents, history)) = bundle else {
      return Ok(None);
    };
    Ok(Some(ApplicationDetail {
      application: raw.into_application()?,
      documents:   decode_documents(documents)?,
      history:     decode_history(history)?,
    }))
  }

  async fn list_applications(
    &self,
    status: Option<ApplicationStatus>,
  ) -> Result<Vec<SchemeApplication>> {
    let status_str = status.map(ApplicationStatus::as_str);
    let raws = self
      .call(move |conn| {
        let raws = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLS} FROM scheme_applications WHERE status = ?1
             ORDER BY submitted_at DESC, application_id"
          ))?;
          stmt
            .query_map(rusqlite::params![s], map_application)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLS} FROM scheme_applications
             ORDER BY submitted_at DESC, application_id"
          ))?;
          stmt
            .query_map([], map_application)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(raws)
      })
      .await?;
    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  async fn list_applications_for_farmer(
    &self,
    farmer_id: Uuid,
  ) -> Result<Vec<SchemeApplication>> {
    let key = encode_uuid(farmer_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPLICATION_COLS} FROM scheme_applications WHERE farmer_id = ?1
           ORDER BY submitted_at DESC, application_id"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![key], map_application)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  async fn transition_application(
    &self,
    id: Uuid,
    next: ApplicationStatus,
    actor: Actor,
    remarks: Option<String>,
  ) -> Result<ApplicationDetail> {
    let key = encode_uuid(id);
    let (application, documents, history) = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_application(&tx, &key)? else {
          return Err(domain(Error::ApplicationNotFound(id)));
        };
        let mut application = raw.into_application().map_err(domain)?;
        if !application.status.can_transition_to(next) {
          return Err(domain(Error::InvalidApplicationTransition {
            from: application.status,
            to:   next,
          }));
        }
        let now = Utc::now();
        application.status = next;
        if next.is_terminal() && application.review_date.is_none() {
          application.reviewed_by = Some(actor.id);
          application.review_date = Some(now);
        }
        tx.execute(
          "UPDATE scheme_applications SET status = ?1, reviewed_by = ?2, review_date = ?3
           WHERE application_id = ?4",
          rusqlite::params![
            next.as_str(),
            application.reviewed_by.map(encode_uuid),
            application.review_date.map(encode_dt),
            key,
          ],
        )?;
        append_history(&tx, &key, next, remarks.as_deref(), actor, now)?;
        let documents = document_rows(&tx, &key)?;
        let history = history_rows(&tx, &key)?;
        tx.commit()?;
        Ok((application, documents, history))
      })
      .await?;

    Ok(ApplicationDetail {
      application,
      documents: decode_documents(documents)?,
      history: decode_history(history)?,
    })
  }

  async fn verify_documents(
    &self,
    id: Uuid,
    updates: Vec<DocumentVerification>,
    actor: Actor,
  ) -> Result<ApplicationDetail> {
    let key = encode_uuid(id);
    let (application, documents, history) = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_application(&tx, &key)? else {
          return Err(domain(Error::ApplicationNotFound(id)));
        };
        let application = raw.into_application().map_err(domain)?;
        let now = Utc::now();
        for update in updates {
          let doc_key = encode_uuid(update.document_id);
          let row: Option<(String, bool)> = tx
            .query_row(
              "SELECT name, verified FROM application_documents
               WHERE document_id = ?1 AND application_id = ?2",
              rusqlite::params![doc_key, key],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
          let Some((name, current)) = row else {
            return Err(domain(Error::DocumentNotFound {
              application: id,
              document:    update.document_id,
            }));
          };
          if current == update.verified {
            continue;
          }
          tx.execute(
            "UPDATE application_documents SET verified = ?1 WHERE document_id = ?2",
            rusqlite::params![update.verified, doc_key],
          )?;
          let remarks = if update.verified {
            format!("document {name} verified")
          } else {
            format!("document {name} unverified")
          };
          append_history(&tx, &key, application.status, Some(&remarks), actor, now)?;
        }
        let documents = document_rows(&tx, &key)?;
        let history = history_rows(&tx, &key)?;
        tx.commit()?;
        Ok((application, documents, history))
      })
      .await?;

    Ok(ApplicationDetail {
      application,
      documents: decode_documents(documents)?,
      history: decode_history(history)?,
    })
  }

  // ── Field status ──────────────────────────────────────────────────────────

  async fn upsert_field_status(
    &self,
    farmer_id: Uuid,
    health: FieldHealth,
    notes: Option<String>,
  ) -> Result<FieldStatus> {
    let status = FieldStatus {
      farmer_id,
      health,
      notes,
      updated_at: Utc::now(),
    };

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let key = encode_uuid(status.farmer_id);
        if !row_exists(&tx, "SELECT 1 FROM farmers WHERE farmer_id = ?1", &key)? {
          return Err(domain(Error::FarmerNotFound(status.farmer_id)));
        }
        tx.execute(
          "INSERT INTO field_statuses (farmer_id, health, notes, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(farmer_id) DO UPDATE SET
             health = excluded.health,
             notes = excluded.notes,
             updated_at = excluded.updated_at",
          rusqlite::params![
            key,
            status.health.as_str(),
            status.notes,
            encode_dt(status.updated_at)
          ],
        )?;
        tx.commit()?;
        Ok(status)
      })
      .await
  }

  async fn get_field_status(&self, farmer_id: Uuid) -> Result<Option<FieldStatus>> {
    let key = encode_uuid(farmer_id);
    let raw = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT farmer_id, health, notes, updated_at FROM field_statuses
               WHERE farmer_id = ?1",
              rusqlite::params![key],
              |row| {
                Ok(RawFieldStatus {
                  farmer_id:  row.get(0)?,
                  health:     row.get(1)?,
                  notes:      row.get(2)?,
                  updated_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawFieldStatus::into_field_status).transpose()
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn settings(&self) -> Result<Settings> {
    let initial = Settings::initial(Utc::now());
    let templates_json = encode_templates(&initial.notification_templates)?;
    let updated_str = encode_dt(initial.updated_at);
    let raw = self
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO settings (id, notification_templates, sms_enabled, maintenance_mode, updated_at)
           VALUES (1, ?1, 1, 0, ?2)",
          rusqlite::params![templates_json, updated_str],
        )?;
        Ok(settings_row(conn)?)
      })
      .await?;
    raw.into_settings()
  }

  async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
    let initial = Settings::initial(Utc::now());
    let templates_json = encode_templates(&initial.notification_templates)?;
    let updated_str = encode_dt(initial.updated_at);
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT OR IGNORE INTO settings (id, notification_templates, sms_enabled, maintenance_mode, updated_at)
           VALUES (1, ?1, 1, 0, ?2)",
          rusqlite::params![templates_json, updated_str],
        )?;
        let mut settings = settings_row(&tx)?.into_settings().map_err(domain)?;
        if let Some(templates) = update.notification_templates {
          settings.notification_templates = templates;
        }
        if let Some(enabled) = update.sms_enabled {
          settings.sms_enabled = enabled;
        }
        if let Some(maintenance) = update.maintenance_mode {
          settings.maintenance_mode = maintenance;
        }
        settings.updated_at = Utc::now();
        tx.execute(
          "UPDATE settings SET notification_templates = ?1, sms_enabled = ?2,
             maintenance_mode = ?3, updated_at = ?4
           WHERE id = 1",
          rusqlite::params![
            encode_templates(&settings.notification_templates).map_err(domain)?,
            settings.sms_enabled,
            settings.maintenance_mode,
            encode_dt(settings.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(settings)
      })
      .await
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  async fn farmer_stats(&self) -> Result<FarmerStats> {
    self
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM farmers", [], |row| row.get(0))?;
        let assigned: i64 = conn.query_row(
          "SELECT COUNT(*) FROM farmers WHERE assigned_executive IS NOT NULL",
          [],
          |row| row.get(0),
        )?;
        let total_income: i64 = conn.query_row(
          "SELECT COALESCE(SUM(income), 0) FROM farmers",
          [],
          |row| row.get(0),
        )?;
        let average_income: Option<f64> =
          conn.query_row("SELECT AVG(income) FROM farmers", [], |row| row.get(0))?;
        let average_credit_score: Option<f64> = conn.query_row(
          "SELECT AVG(credit_score) FROM farmers",
          [],
          |row| row.get(0),
        )?;
        let by_village = group_counts(
          conn,
          "SELECT village, COUNT(*) FROM farmers WHERE village IS NOT NULL
           GROUP BY village ORDER BY COUNT(*) DESC, village",
        )?;
        let by_crop = group_counts(
          conn,
          "SELECT je.value, COUNT(*) FROM farmers f, json_each(f.crops) je
           GROUP BY je.value ORDER BY COUNT(*) DESC, je.value",
        )?;
        Ok(FarmerStats {
          total: total as u64,
          assigned: assigned as u64,
          unassigned: (total - assigned) as u64,
          total_income,
          average_income,
          average_credit_score,
          by_village,
          by_crop,
        })
      })
      .await
  }

  async fn executive_count(&self) -> Result<u64> {
    self
      .call(move |conn| {
        let count: i64 =
          conn.query_row("SELECT COUNT(*) FROM executives", [], |row| row.get(0))?;
        Ok(count as u64)
      })
      .await
  }

  async fn request_stats(&self) -> Result<RequestStats> {
    self
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
        let by_status = group_counts(
          conn,
          "SELECT status, COUNT(*) FROM requests GROUP BY status
           ORDER BY COUNT(*) DESC, status",
        )?;
        let by_priority = group_counts(
          conn,
          "SELECT priority, COUNT(*) FROM requests GROUP BY priority
           ORDER BY COUNT(*) DESC, priority",
        )?;
        Ok(RequestStats {
          total: total as u64,
          by_status,
          by_priority,
        })
      })
      .await
  }

  async fn scheme_stats(&self) -> Result<SchemeStats> {
    self
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM schemes", [], |row| row.get(0))?;
        let by_status = group_counts(
          conn,
          "SELECT status, COUNT(*) FROM schemes GROUP BY status
           ORDER BY COUNT(*) DESC, status",
        )?;
        Ok(SchemeStats {
          total: total as u64,
          by_status,
        })
      })
      .await
  }

  async fn application_stats(&self) -> Result<ApplicationStats> {
    self
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM scheme_applications",
          [],
          |row| row.get(0),
        )?;
        let by_status = group_counts(
          conn,
          "SELECT status, COUNT(*) FROM scheme_applications GROUP BY status
           ORDER BY COUNT(*) DESC, status",
        )?;
        Ok(ApplicationStats {
          total: total as u64,
          by_status,
        })
      })
      .await
  }
}

// ─── Column lists ────────────────────────────────────────────────────────────

const ADMIN_COLS: &str = "admin_id, username, name, password_hash, created_at";

const EXECUTIVE_COLS: &str =
  "executive_id, name, email, mobile, region, password_hash, created_at";

const FARMER_COLS: &str =
  "farmer_id, name, mobile, village, panchayat, caste, gender, income, \
   estimated_income, credit_score, crops, assigned_executive, password_hash, \
   created_at";

const REQUEST_COLS: &str =
  "request_id, farmer_id, assigned_executive, title, description, category, \
   priority, status, created_at, resolved_at";

const SCHEME_COLS: &str =
  "scheme_id, title, category, description, eligibility, benefits, \
   application_process, required_documents, application_deadline, \
   contact_info, status, relevance, created_at";

const APPLICATION_COLS: &str =
  "application_id, reference, farmer_id, scheme_id, status, reviewed_by, \
   review_date, submitted_at";

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn map_admin(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAdmin> {
  Ok(RawAdmin {
    admin_id:      row.get(0)?,
    username:      row.get(1)?,
    name:          row.get(2)?,
    password_hash: row.get(3)?,
    created_at:    row.get(4)?,
  })
}

fn map_executive(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawExecutive> {
  Ok(RawExecutive {
    executive_id:     row.get(0)?,
    name:             row.get(1)?,
    email:            row.get(2)?,
    mobile:           row.get(3)?,
    region:           row.get(4)?,
    password_hash:    row.get(5)?,
    created_at:       row.get(6)?,
    assigned_farmers: Vec::new(),
  })
}

fn map_farmer(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFarmer> {
  Ok(RawFarmer {
    farmer_id:          row.get(0)?,
    name:               row.get(1)?,
    mobile:             row.get(2)?,
    village:            row.get(3)?,
    panchayat:          row.get(4)?,
    caste:              row.get(5)?,
    gender:             row.get(6)?,
    income:             row.get(7)?,
    estimated_income:   row.get(8)?,
    credit_score:       row.get(9)?,
    crops:              row.get(10)?,
    assigned_executive: row.get(11)?,
    password_hash:      row.get(12)?,
    created_at:         row.get(13)?,
    saved_schemes:      Vec::new(),
  })
}

fn map_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    request_id:         row.get(0)?,
    farmer_id:          row.get(1)?,
    assigned_executive: row.get(2)?,
    title:              row.get(3)?,
    description:        row.get(4)?,
    category:           row.get(5)?,
    priority:           row.get(6)?,
    status:             row.get(7)?,
    created_at:         row.get(8)?,
    resolved_at:        row.get(9)?,
  })
}

fn map_scheme(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawScheme> {
  Ok(RawScheme {
    scheme_id:            row.get(0)?,
    title:                row.get(1)?,
    category:             row.get(2)?,
    description:          row.get(3)?,
    eligibility:          row.get(4)?,
    benefits:             row.get(5)?,
    application_process:  row.get(6)?,
    required_documents:   row.get(7)?,
    application_deadline: row.get(8)?,
    contact_info:         row.get(9)?,
    status:               row.get(10)?,
    relevance:            row.get(11)?,
    created_at:           row.get(12)?,
  })
}

fn map_application(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawApplication> {
  Ok(RawApplication {
    application_id: row.get(0)?,
    reference:      row.get(1)?,
    farmer_id:      row.get(2)?,
    scheme_id:      row.get(3)?,
    status:         row.get(4)?,
    reviewed_by:    row.get(5)?,
    review_date:    row.get(6)?,
    submitted_at:   row.get(7)?,
  })
}

// ─── Row loaders ─────────────────────────────────────────────────────────────

fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  key: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![key], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

fn load_admin_by(
  conn: &rusqlite::Connection,
  column: &str,
  key: &str,
) -> rusqlite::Result<Option<RawAdmin>> {
  conn
    .query_row(
      &format!("SELECT {ADMIN_COLS} FROM admins WHERE {column} = ?1"),
      rusqlite::params![key],
      map_admin,
    )
    .optional()
}

fn load_executive_by(
  conn: &rusqlite::Connection,
  column: &str,
  key: &str,
) -> rusqlite::Result<Option<RawExecutive>> {
  let Some(mut raw) = conn
    .query_row(
      &format!("SELECT {EXECUTIVE_COLS} FROM executives WHERE {column} = ?1"),
      rusqlite::params![key],
      map_executive,
    )
    .optional()?
  else {
    return Ok(None);
  };
  raw.assigned_farmers = assigned_farmer_ids(conn, &raw.executive_id)?;
  Ok(Some(raw))
}

fn load_farmer_by(
  conn: &rusqlite::Connection,
  column: &str,
  key: &str,
) -> rusqlite::Result<Option<RawFarmer>> {
  let Some(mut raw) = conn
    .query_row(
      &format!("SELECT {FARMER_COLS} FROM farmers WHERE {column} = ?1"),
      rusqlite::params![key],
      map_farmer,
    )
    .optional()?
  else {
    return Ok(None);
  };
  raw.saved_schemes = saved_scheme_ids(conn, &raw.farmer_id)?;
  Ok(Some(raw))
}

fn load_request(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<RawRequest>> {
  conn
    .query_row(
      &format!("SELECT {REQUEST_COLS} FROM requests WHERE request_id = ?1"),
      rusqlite::params![key],
      map_request,
    )
    .optional()
}

fn load_scheme(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<RawScheme>> {
  conn
    .query_row(
      &format!("SELECT {SCHEME_COLS} FROM schemes WHERE scheme_id = ?1"),
      rusqlite::params![key],
      map_scheme,
    )
    .optional()
}

fn load_application(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<RawApplication>> {
  conn
    .query_row(
      &format!(
        "SELECT {APPLICATION_COLS} FROM scheme_applications WHERE application_id = ?1"
      ),
      rusqlite::params![key],
      map_application,
    )
    .optional()
}

fn saved_scheme_ids(
  conn: &rusqlite::Connection,
  farmer_key: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT scheme_id FROM saved_schemes WHERE farmer_id = ?1
     ORDER BY saved_at, scheme_id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![farmer_key], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

fn assigned_farmer_ids(
  conn: &rusqlite::Connection,
  executive_key: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT farmer_id FROM farmers WHERE assigned_executive = ?1
     ORDER BY created_at, farmer_id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![executive_key], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

fn comment_rows(
  conn: &rusqlite::Connection,
  request_key: &str,
) -> rusqlite::Result<Vec<RawComment>> {
  let mut stmt = conn.prepare(
    "SELECT comment_id, request_id, author_role, author_id, body, posted_at
     FROM request_comments WHERE request_id = ?1 ORDER BY posted_at, comment_id",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![request_key], |row| {
      Ok(RawComment {
        comment_id:  row.get(0)?,
        request_id:  row.get(1)?,
        author_role: row.get(2)?,
        author_id:   row.get(3)?,
        body:        row.get(4)?,
        posted_at:   row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn document_rows(
  conn: &rusqlite::Connection,
  application_key: &str,
) -> rusqlite::Result<Vec<RawDocument>> {
  let mut stmt = conn.prepare(
    "SELECT document_id, name, verified FROM application_documents
     WHERE application_id = ?1 ORDER BY position",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![application_key], |row| {
      Ok(RawDocument {
        document_id: row.get(0)?,
        name:        row.get(1)?,
        verified:    row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn history_rows(
  conn: &rusqlite::Connection,
  application_key: &str,
) -> rusqlite::Result<Vec<RawStatusChange>> {
  let mut stmt = conn.prepare(
    "SELECT status, remarks, actor_role, actor_id, changed_at
     FROM application_history WHERE application_id = ?1
     ORDER BY changed_at, rowid",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![application_key], |row| {
      Ok(RawStatusChange {
        status:     row.get(0)?,
        remarks:    row.get(1)?,
        actor_role: row.get(2)?,
        actor_id:   row.get(3)?,
        changed_at: row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn settings_row(conn: &rusqlite::Connection) -> rusqlite::Result<RawSettings> {
  conn.query_row(
    "SELECT notification_templates, sms_enabled, maintenance_mode, updated_at
     FROM settings WHERE id = 1",
    [],
    |row| {
      Ok(RawSettings {
        notification_templates: row.get(0)?,
        sms_enabled:            row.get(1)?,
        maintenance_mode:       row.get(2)?,
        updated_at:             row.get(3)?,
      })
    },
  )
}

fn insert_admin(conn: &rusqlite::Connection, admin: &Admin) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO admins (admin_id, username, name, password_hash, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(admin.admin_id),
      admin.username,
      admin.name,
      admin.password_hash,
      encode_dt(admin.created_at),
    ],
  )?;
  Ok(())
}

fn append_history(
  conn: &rusqlite::Connection,
  application_key: &str,
  status: ApplicationStatus,
  remarks: Option<&str>,
  actor: Actor,
  at: DateTime<Utc>,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO application_history (history_id, application_id, status, remarks,
       actor_role, actor_id, changed_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      application_key,
      status.as_str(),
      remarks,
      actor.role.as_str(),
      encode_uuid(actor.id),
      encode_dt(at),
    ],
  )?;
  Ok(())
}

fn group_counts(
  conn: &rusqlite::Connection,
  sql: &str,
) -> rusqlite::Result<Vec<GroupCount>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map([], |row| {
      Ok(GroupCount {
        key:   row.get(0)?,
        count: row.get::<_, i64>(1)? as u64,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn decode_documents(raws: Vec<RawDocument>) -> Result<Vec<ApplicationDocument>> {
  raws.into_iter().map(RawDocument::into_document).collect()
}

fn decode_history(raws: Vec<RawStatusChange>) -> Result<Vec<StatusChange>> {
  raws
    .into_iter()
    .map(RawStatusChange::into_status_change)
    .collect()
}
