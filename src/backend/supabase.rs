//! Client for the hosted backend-as-a-service: GoTrue auth, PostgREST
//! rows, Storage blobs. Thin request/response plumbing: no retries, no
//! caching beyond the in-process session, errors carried upstream-verbatim.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::model::{ScheduleRow, TenantId};

use super::{
    AuthProvider, BackendError, BlobObject, BlobStore, RowFilter, RowStore, Session, UploadOpts,
};

const SCHEDULES_TABLE: &str = "schedules";
const VIDEO_BUCKET: &str = "videos";

pub struct SupabaseBackend {
    http: reqwest::Client,
    base: String,
    anon_key: String,
    /// Access token + session after a successful sign-in; the bearer falls
    /// back to the anon key while signed out.
    auth_state: RwLock<Option<(String, Session)>>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Deserialize)]
struct ListedObject {
    name: String,
    #[serde(default)]
    id: Option<String>,
}

impl SupabaseBackend {
    pub fn new(base: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base,
            anon_key: anon_key.into(),
            auth_state: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn bearer(&self) -> String {
        match self.auth_state.read().await.as_ref() {
            Some((token, _)) => token.clone(),
            None => self.anon_key.clone(),
        }
    }

    async fn send(
        &self,
        op: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::new(op, format!("HTTP {status}: {body}")));
        }
        Ok(response)
    }

    fn session_from(
        op: &'static str,
        auth: AuthResponse,
    ) -> Result<(String, Session), BackendError> {
        let token = auth
            .access_token
            .ok_or_else(|| BackendError::new(op, "response carried no access token"))?;
        let user = auth
            .user
            .ok_or_else(|| BackendError::new(op, "response carried no user"))?;
        let session = Session {
            tenant: TenantId::new(user.id),
            email: user.email.unwrap_or_default(),
        };
        Ok((token, session))
    }

    fn row_query(filter: &RowFilter) -> String {
        match filter {
            RowFilter::Tenant(t) => format!("restaurant_id=eq.{}", t.as_str()),
            RowFilter::TenantDay(t, day) => {
                format!("restaurant_id=eq.{}&day_of_week=eq.{}", t.as_str(), day)
            }
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let op = "auth.sign_in";
        let response = self
            .send(
                op,
                self.http
                    .post(self.url("/auth/v1/token?grant_type=password"))
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))?;
        let (token, session) = Self::session_from(op, auth)?;
        *self.auth_state.write().await = Some((token, session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, BackendError> {
        let op = "auth.sign_up";
        let response = self
            .send(
                op,
                self.http
                    .post(self.url("/auth/v1/signup"))
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))?;
        // Instances requiring email confirmation answer without a token;
        // the account exists but there is no session yet.
        if auth.access_token.is_none() {
            return Ok(None);
        }
        let (token, session) = Self::session_from(op, auth)?;
        *self.auth_state.write().await = Some((token, session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.send("auth.sign_out", self.http.post(self.url("/auth/v1/logout")))
            .await?;
        *self.auth_state.write().await = None;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        self.send(
            "auth.reset_password",
            self.http
                .post(self.url("/auth/v1/recover"))
                .json(&json!({ "email": email })),
        )
        .await?;
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self
            .auth_state
            .read()
            .await
            .as_ref()
            .map(|(_, session)| session.clone()))
    }
}

#[async_trait]
impl RowStore for SupabaseBackend {
    async fn select(&self, filter: &RowFilter) -> Result<Vec<ScheduleRow>, BackendError> {
        let op = "rows.select";
        let url = format!(
            "{}?select=*&{}",
            self.url(&format!("/rest/v1/{SCHEDULES_TABLE}")),
            Self::row_query(filter)
        );
        let response = self.send(op, self.http.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))
    }

    async fn insert(&self, rows: Vec<ScheduleRow>) -> Result<(), BackendError> {
        self.send(
            "rows.insert",
            self.http
                .post(self.url(&format!("/rest/v1/{SCHEDULES_TABLE}")))
                .header("Prefer", "return=minimal")
                .json(&rows),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, filter: &RowFilter) -> Result<u64, BackendError> {
        let op = "rows.delete";
        let url = format!(
            "{}?{}",
            self.url(&format!("/rest/v1/{SCHEDULES_TABLE}")),
            Self::row_query(filter)
        );
        let response = self
            .send(
                op,
                self.http
                    .delete(url)
                    .header("Prefer", "return=representation"),
            )
            .await?;
        let removed: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))?;
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl BlobStore for SupabaseBackend {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, BackendError> {
        let op = "blobs.list";
        let response = self
            .send(
                op,
                self.http
                    .post(self.url(&format!("/storage/v1/object/list/{VIDEO_BUCKET}")))
                    .json(&json!({ "prefix": prefix, "limit": 1000, "offset": 0 })),
            )
            .await?;
        let objects: Vec<ListedObject> = response
            .json()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))?;
        Ok(objects
            .into_iter()
            .map(|o| BlobObject {
                id: o.id.unwrap_or_else(|| o.name.clone()),
                name: o.name,
            })
            .collect())
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        opts: &UploadOpts,
    ) -> Result<(), BackendError> {
        let mut request = self
            .http
            .post(self.url(&format!("/storage/v1/object/{VIDEO_BUCKET}/{path}")))
            .header("Content-Type", &opts.content_type)
            .header("x-upsert", if opts.upsert { "true" } else { "false" });
        if let Some(secs) = opts.cache_control {
            request = request.header("Cache-Control", format!("max-age={secs}"));
        }
        self.send("blobs.upload", request.body(bytes)).await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Bytes, BackendError> {
        let op = "blobs.download";
        let response = self
            .send(
                op,
                self.http
                    .get(self.url(&format!("/storage/v1/object/{VIDEO_BUCKET}/{path}"))),
            )
            .await?;
        response
            .bytes()
            .await
            .map_err(|e| BackendError::new(op, e.to_string()))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
        self.send(
            "blobs.remove",
            self.http
                .delete(self.url(&format!("/storage/v1/object/{VIDEO_BUCKET}")))
                .json(&json!({ "prefixes": paths })),
        )
        .await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{VIDEO_BUCKET}/{path}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;

    #[test]
    fn row_queries_are_tenant_scoped() {
        let tenant = TenantId::new("11111111-2222-3333-4444-555555555555");
        assert_eq!(
            SupabaseBackend::row_query(&RowFilter::Tenant(tenant.clone())),
            "restaurant_id=eq.11111111-2222-3333-4444-555555555555"
        );
        assert_eq!(
            SupabaseBackend::row_query(&RowFilter::TenantDay(tenant, Weekday::Mon)),
            "restaurant_id=eq.11111111-2222-3333-4444-555555555555&day_of_week=eq.Mon"
        );
    }

    #[test]
    fn public_url_points_at_the_bucket() {
        let backend = SupabaseBackend::new("https://demo.supabase.co/", "anon");
        assert_eq!(
            backend.public_url("public/1722600000000-lunch.mp4"),
            "https://demo.supabase.co/storage/v1/object/public/videos/public/1722600000000-lunch.mp4"
        );
    }

    #[test]
    fn session_from_requires_token_and_user() {
        let err = SupabaseBackend::session_from(
            "auth.sign_in",
            AuthResponse {
                access_token: None,
                user: None,
            },
        )
        .unwrap_err();
        assert!(err.message.contains("no access token"));

        let (token, session) = SupabaseBackend::session_from(
            "auth.sign_in",
            AuthResponse {
                access_token: Some("jwt".into()),
                user: Some(AuthUser {
                    id: "user-1".into(),
                    email: Some("kim@example.com".into()),
                }),
            },
        )
        .unwrap();
        assert_eq!(token, "jwt");
        assert_eq!(session.tenant, TenantId::new("user-1"));
    }
}
