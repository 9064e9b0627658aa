use crate::config::toml_config::{BackendConfig, TableNames};
use crate::domain::model::{DisposalOrder, Receptacle, UserAccount};
use crate::domain::ports::PointStore;
use crate::utils::error::{PointsError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

/// [`PointStore`] backed by a Supabase project's PostgREST endpoint.
pub struct SupabaseStore {
    client: Client,
    rest_url: Url,
    tables: TableNames,
}

#[derive(Debug, Deserialize)]
struct NameRow {
    name: String,
}

impl SupabaseStore {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value("backend.api_key", &config.api_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value("backend.api_key", &format!("Bearer {}", config.api_key))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            rest_url: rest_url(&config.url)?,
            tables: config.tables.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.rest_url
            .join(table)
            .map_err(|e| PointsError::InvalidConfigValueError {
                field: "backend.tables".to_string(),
                value: table.to_string(),
                reason: e.to_string(),
            })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        operation: &str,
        table: &str,
        columns: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        tracing::debug!("📡 {}: GET {} {:?}", operation, table, filters);
        let response = self
            .client
            .get(self.table_url(table)?)
            .query(&[("select", columns)])
            .query(filters)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        read_rows(operation, response).await
    }

    /// PATCH with `return=representation`, so the caller learns how many rows
    /// actually changed.
    async fn update(
        &self,
        operation: &str,
        table: &str,
        filters: &[(&str, String)],
        body: serde_json::Value,
    ) -> Result<usize> {
        tracing::debug!("📡 {}: PATCH {} {:?}", operation, table, filters);
        let response = self
            .client
            .patch(self.table_url(table)?)
            .query(filters)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let rows: Vec<serde_json::Value> = read_rows(operation, response).await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl PointStore for SupabaseStore {
    async fn list_receptacles(&self) -> Result<Vec<String>> {
        let rows: Vec<NameRow> = self
            .select("list_receptacles", &self.tables.receptacles, "name", &[])
            .await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn fetch_receptacle(&self, name: &str) -> Result<Option<Receptacle>> {
        let rows = self
            .select(
                "fetch_receptacle",
                &self.tables.receptacles,
                "name,amount,capacity",
                &[("name", eq(name))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let rows = self
            .select(
                "fetch_user",
                &self.tables.users,
                "id,points",
                &[("id", eq(user_id))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_order(&self, order_number: &str) -> Result<Option<DisposalOrder>> {
        let rows = self
            .select(
                "fetch_order",
                &self.tables.orders,
                "order_number,used",
                &[("order_number", eq(order_number))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn claim_order(&self, order_number: &str) -> Result<bool> {
        let changed = self
            .update(
                "claim_order",
                &self.tables.orders,
                &[
                    ("order_number", eq(order_number)),
                    ("used", "eq.false".to_string()),
                ],
                json!({ "used": true }),
            )
            .await?;
        Ok(changed > 0)
    }

    async fn set_points(&self, user_id: &str, points: u64) -> Result<bool> {
        let changed = self
            .update(
                "set_points",
                &self.tables.users,
                &[("id", eq(user_id))],
                json!({ "points": points }),
            )
            .await?;
        Ok(changed > 0)
    }

    async fn set_fill_amount(&self, name: &str, amount: u64) -> Result<bool> {
        let changed = self
            .update(
                "set_fill_amount",
                &self.tables.receptacles,
                &[("name", eq(name))],
                json!({ "amount": amount }),
            )
            .await?;
        Ok(changed > 0)
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| PointsError::InvalidConfigValueError {
        field: field.to_string(),
        value: "<redacted>".to_string(),
        reason: e.to_string(),
    })
}

fn rest_url(base: &str) -> Result<Url> {
    let invalid = |reason: String| PointsError::InvalidConfigValueError {
        field: "backend.url".to_string(),
        value: base.to_string(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join("rest/v1/").map_err(|e| invalid(e.to_string()))
}

fn transport_error(operation: &str, error: reqwest::Error) -> PointsError {
    if error.is_timeout() {
        PointsError::TimeoutError {
            operation: operation.to_string(),
        }
    } else {
        PointsError::HttpError(error)
    }
}

async fn read_rows<T: DeserializeOwned>(operation: &str, response: Response) -> Result<Vec<T>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PointsError::BackendError {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(operation, e))?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url_joins_with_and_without_trailing_slash() {
        assert_eq!(
            rest_url("https://demo.supabase.co").unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/"
        );
        assert_eq!(
            rest_url("https://demo.supabase.co/").unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/"
        );
        assert_eq!(
            rest_url("http://localhost:54321/proxy").unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/"
        );
    }

    #[test]
    fn test_rest_url_rejects_garbage() {
        assert!(matches!(
            rest_url("not a url"),
            Err(PointsError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(eq("ORD1"), "eq.ORD1");
    }
}
