//! XForm catalog queries

use super::client::PostgreSQLClient;
use crate::domain::{FormSummary, RelayError, Result};
use async_trait::async_trait;

/// Read-only listing of the XForms recorded in the backend database
#[async_trait]
pub trait FormCatalog: Send + Sync {
    /// `{id, title}` rows ordered by id, skipping `offset` and returning at
    /// most `limit`
    async fn list_forms(&self, offset: i64, limit: i64) -> Result<Vec<FormSummary>>;
}

/// [`FormCatalog`] backed by the `xlsforms` table
pub struct PostgresFormCatalog {
    client: PostgreSQLClient,
}

impl PostgresFormCatalog {
    const LIST_QUERY: &'static str = "SELECT id, title FROM xlsforms ORDER BY id OFFSET $1 LIMIT $2";

    pub fn new(client: PostgreSQLClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FormCatalog for PostgresFormCatalog {
    async fn list_forms(&self, offset: i64, limit: i64) -> Result<Vec<FormSummary>> {
        if offset < 0 || limit < 0 {
            return Err(RelayError::Validation(format!(
                "offset and limit must be non-negative, got {offset} and {limit}"
            )));
        }

        tracing::debug!(
            offset,
            limit,
            database = %self.client.connection_string_safe(),
            "Listing XForms from catalog"
        );

        let rows = self
            .client
            .query(Self::LIST_QUERY, &[&offset, &limit])
            .await?;

        rows.iter()
            .map(|row| {
                // `id` is SERIAL in the backend schema
                let id: i32 = row
                    .try_get("id")
                    .map_err(|e| RelayError::Database(format!("Failed to read id: {e}")))?;
                let title: Option<String> = row
                    .try_get("title")
                    .map_err(|e| RelayError::Database(format!("Failed to read title: {e}")))?;
                Ok(FormSummary {
                    id: i64::from(id),
                    title: title.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PostgreSQLConfig;
    use crate::config::secret_string;

    // The pool connects lazily, so these never reach a server
    fn catalog() -> PostgresFormCatalog {
        let client = PostgreSQLClient::new(PostgreSQLConfig {
            connection_string: secret_string("postgresql://fmtm:pw@127.0.0.1:1/fmtm".to_string()),
            max_connections: 1,
            connection_timeout_seconds: 1,
        })
        .unwrap();
        PostgresFormCatalog::new(client)
    }

    #[tokio::test]
    async fn test_negative_offset_is_rejected() {
        let err = catalog().list_forms(-1, 10).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert!(err.to_string().contains("-1"));
    }

    #[tokio::test]
    async fn test_negative_limit_is_rejected() {
        let err = catalog().list_forms(0, -5).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_database_error() {
        let err = catalog().list_forms(0, 10).await.unwrap_err();
        assert!(matches!(err, RelayError::Database(_)));
    }
}
