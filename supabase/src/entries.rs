use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{SupabaseClient, SupabaseError, SupabaseUrl};

const ENTRIES_PATH: &str = "/rest/v1/entries";

/// One row of the `entries` table. One row per `(user_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    pub user_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub happy_content: Option<String>,
    #[serde(default)]
    pub sad_content: Option<String>,
}

impl EntryRow {
    pub fn happy(&self) -> &str {
        self.happy_content.as_deref().unwrap_or_default()
    }

    pub fn sad(&self) -> &str {
        self.sad_content.as_deref().unwrap_or_default()
    }
}

impl SupabaseClient {
    fn entries_url(&self, user_id: &str) -> SupabaseUrl {
        self.url(ENTRIES_PATH).with_filter("user_id", "eq", user_id)
    }

    fn entry_url(&self, user_id: &str, date: &str) -> SupabaseUrl {
        self.entries_url(user_id).with_filter("date", "eq", date)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_entries(&self, user_id: &str) -> Result<Vec<EntryRow>, SupabaseError> {
        let url = self.entries_url(user_id).with_query("select", "*");
        self.fetch(self.user_request(Method::GET, &url)?).await
    }

    pub async fn get_entry(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<EntryRow>, SupabaseError> {
        let url = self.entry_url(user_id, date).with_query("select", "*");
        let rows: Vec<EntryRow> = self.fetch(self.user_request(Method::GET, &url)?).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert or replace the row for `(user_id, date)`.
    #[tracing::instrument(skip(self, happy, sad))]
    pub async fn upsert_entry(
        &self,
        user_id: &str,
        date: &str,
        happy: &str,
        sad: &str,
    ) -> Result<(), SupabaseError> {
        let url = self
            .url(ENTRIES_PATH)
            .with_query("on_conflict", "user_id,date");
        let row = EntryRow {
            user_id: user_id.to_string(),
            date: date.to_string(),
            happy_content: Some(happy.to_string()),
            sad_content: Some(sad.to_string()),
        };

        self.send_without_body(
            self.user_request(Method::POST, &url)?
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&[row]),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_entry(&self, user_id: &str, date: &str) -> Result<(), SupabaseError> {
        let url = self.entry_url(user_id, date);
        self.send_without_body(self.user_request(Method::DELETE, &url)?)
            .await
    }
}
