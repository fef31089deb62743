//! In-memory implementation of all three collaborator traits. Backs the
//! test suite and the demo daemon; also the reference for what the core
//! assumes of the hosted backend (id assignment, upsert semantics,
//! missing-path removal being a no-op).

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{ScheduleRow, TenantId};

use super::{
    AuthProvider, BackendError, BlobObject, BlobStore, RowFilter, RowStore, Session, UploadOpts,
};

pub struct MemoryBackend {
    users: DashMap<String, (String, TenantId)>,
    session: Mutex<Option<Session>>,
    rows: DashMap<String, ScheduleRow>,
    blobs: DashMap<String, (String, Bytes)>,
    calls: DashMap<&'static str, u64>,
    armed_failure: Mutex<Option<(&'static str, String)>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            session: Mutex::new(None),
            rows: DashMap::new(),
            blobs: DashMap::new(),
            calls: DashMap::new(),
            armed_failure: Mutex::new(None),
        }
    }

    /// Pre-register an account without going through `sign_up`.
    pub fn add_user(&self, email: &str, password: &str, tenant: TenantId) {
        self.users
            .insert(email.to_string(), (password.to_string(), tenant));
    }

    /// Arm a one-shot failure for the named operation (e.g. `"rows.insert"`).
    /// The next matching call consumes it and fails with the given message.
    pub fn arm_failure(&self, op: &'static str, message: &str) {
        *self.armed_failure.lock().unwrap() = Some((op, message.to_string()));
    }

    /// How many times the named operation has been invoked.
    pub fn calls(&self, op: &'static str) -> u64 {
        self.calls.get(op).map(|c| *c.value()).unwrap_or(0)
    }

    /// Total collaborator calls of any kind.
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    fn enter(&self, op: &'static str) -> Result<(), BackendError> {
        *self.calls.entry(op).or_insert(0) += 1;
        let mut armed = self.armed_failure.lock().unwrap();
        if armed.as_ref().map(|(armed_op, _)| *armed_op) == Some(op) {
            let (_, message) = armed.take().unwrap();
            return Err(BackendError::new(op, message));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        self.enter("auth.sign_in")?;
        let Some(entry) = self.users.get(email) else {
            return Err(BackendError::new("auth.sign_in", "invalid login credentials"));
        };
        let (stored_password, tenant) = entry.value();
        if stored_password != password {
            return Err(BackendError::new("auth.sign_in", "invalid login credentials"));
        }
        let session = Session {
            tenant: tenant.clone(),
            email: email.to_string(),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, BackendError> {
        self.enter("auth.sign_up")?;
        if self.users.contains_key(email) {
            return Err(BackendError::new("auth.sign_up", "user already registered"));
        }
        let tenant = TenantId::new(Ulid::new().to_string());
        self.users
            .insert(email.to_string(), (password.to_string(), tenant.clone()));
        let session = Session {
            tenant,
            email: email.to_string(),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.enter("auth.sign_out")?;
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        self.enter("auth.reset_password")?;
        // Providers answer uniformly whether or not the account exists.
        let _ = email;
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, BackendError> {
        self.enter("auth.session")?;
        Ok(self.session.lock().unwrap().clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, BackendError> {
        self.enter("blobs.list")?;
        let dir = format!("{prefix}/");
        let mut objects: Vec<BlobObject> = self
            .blobs
            .iter()
            .filter_map(|entry| {
                let name = entry.key().strip_prefix(&dir)?;
                Some(BlobObject {
                    id: entry.value().0.clone(),
                    name: name.to_string(),
                })
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        opts: &UploadOpts,
    ) -> Result<(), BackendError> {
        self.enter("blobs.upload")?;
        if !opts.upsert && self.blobs.contains_key(path) {
            return Err(BackendError::new("blobs.upload", "the resource already exists"));
        }
        self.blobs
            .insert(path.to_string(), (Ulid::new().to_string(), bytes));
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Bytes, BackendError> {
        self.enter("blobs.download")?;
        self.blobs
            .get(path)
            .map(|entry| entry.value().1.clone())
            .ok_or_else(|| BackendError::new("blobs.download", "object not found"))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
        self.enter("blobs.remove")?;
        for path in paths {
            self.blobs.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://videos/{path}")
    }
}

#[async_trait]
impl RowStore for MemoryBackend {
    async fn select(&self, filter: &RowFilter) -> Result<Vec<ScheduleRow>, BackendError> {
        self.enter("rows.select")?;
        let mut rows: Vec<ScheduleRow> = self
            .rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Insertion order is not observable from a DashMap; key on the
        // store-assigned id so repeated selects agree.
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn insert(&self, rows: Vec<ScheduleRow>) -> Result<(), BackendError> {
        self.enter("rows.insert")?;
        for mut row in rows {
            let id = Ulid::new().to_string();
            row.id = Some(id.clone());
            self.rows.insert(id, row);
        }
        Ok(())
    }

    async fn delete(&self, filter: &RowFilter) -> Result<u64, BackendError> {
        self.enter("rows.delete")?;
        let doomed: Vec<String> = self
            .rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();
        let removed = doomed.len() as u64;
        for id in doomed {
            self.rows.remove(&id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;

    fn row(tenant: &str, day: Weekday, start: &str, end: &str) -> ScheduleRow {
        ScheduleRow {
            id: None,
            restaurant_id: tenant.to_string(),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            video_name: "a.mp4".to_string(),
            video_url: "memory://videos/public/a.mp4".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn rows_are_tenant_scoped() {
        let backend = MemoryBackend::new();
        backend
            .insert(vec![
                row("t1", Weekday::Mon, "16:00", "18:00"),
                row("t2", Weekday::Mon, "16:00", "18:00"),
            ])
            .await
            .unwrap();

        let t1 = backend
            .select(&RowFilter::Tenant(TenantId::new("t1")))
            .await
            .unwrap();
        assert_eq!(t1.len(), 1);
        assert_eq!(t1[0].restaurant_id, "t1");
        assert!(t1[0].id.is_some()); // store assigns ids

        let removed = backend
            .delete(&RowFilter::Tenant(TenantId::new("t1")))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let t2 = backend
            .select(&RowFilter::Tenant(TenantId::new("t2")))
            .await
            .unwrap();
        assert_eq!(t2.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_tenant_and_day() {
        let backend = MemoryBackend::new();
        backend
            .insert(vec![
                row("t1", Weekday::Mon, "16:00", "18:00"),
                row("t1", Weekday::Tue, "16:00", "18:00"),
            ])
            .await
            .unwrap();

        let removed = backend
            .delete(&RowFilter::TenantDay(TenantId::new("t1"), Weekday::Mon))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let rest = backend
            .select(&RowFilter::Tenant(TenantId::new("t1")))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].day_of_week, Weekday::Tue);
    }

    #[tokio::test]
    async fn upload_without_upsert_rejects_existing_path() {
        let backend = MemoryBackend::new();
        let opts = UploadOpts {
            content_type: "video/mp4".into(),
            cache_control: None,
            upsert: false,
        };
        backend
            .upload("public/a.mp4", Bytes::from_static(b"x"), &opts)
            .await
            .unwrap();
        let err = backend
            .upload("public/a.mp4", Bytes::from_static(b"y"), &opts)
            .await
            .unwrap_err();
        assert!(err.message.contains("already exists"));
    }

    #[tokio::test]
    async fn list_is_prefix_scoped() {
        let backend = MemoryBackend::new();
        let opts = UploadOpts {
            content_type: "video/mp4".into(),
            cache_control: None,
            upsert: false,
        };
        backend
            .upload("public/a.mp4", Bytes::from_static(b"x"), &opts)
            .await
            .unwrap();
        backend
            .upload("private/b.mp4", Bytes::from_static(b"x"), &opts)
            .await
            .unwrap();

        let listed = backend.list("public").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a.mp4");
    }

    #[tokio::test]
    async fn armed_failure_fires_once() {
        let backend = MemoryBackend::new();
        backend.arm_failure("rows.insert", "boom");
        let err = backend
            .insert(vec![row("t1", Weekday::Mon, "16:00", "18:00")])
            .await
            .unwrap_err();
        assert_eq!(err.message, "boom");
        // Disarmed after firing.
        backend
            .insert(vec![row("t1", Weekday::Mon, "16:00", "18:00")])
            .await
            .unwrap();
        assert_eq!(backend.calls("rows.insert"), 2);
    }

    #[tokio::test]
    async fn sign_in_checks_credentials() {
        let backend = MemoryBackend::new();
        backend.add_user("kim@example.com", "hunter2", TenantId::new("t1"));

        let err = backend.sign_in("kim@example.com", "wrong").await.unwrap_err();
        assert!(err.message.contains("invalid login"));
        assert!(backend.session().await.unwrap().is_none());

        let session = backend.sign_in("kim@example.com", "hunter2").await.unwrap();
        assert_eq!(session.tenant, TenantId::new("t1"));
        assert_eq!(backend.session().await.unwrap(), Some(session));

        backend.sign_out().await.unwrap();
        assert!(backend.session().await.unwrap().is_none());
    }
}
