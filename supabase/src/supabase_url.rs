use crate::SupabaseError;

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseUrl(String);

impl AsRef<str> for SupabaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SupabaseUrl {
    /// Validates a project URL such as `https://abc.supabase.co`.
    pub fn parse(raw: &str) -> Result<Self, SupabaseError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed)
            .map_err(|e| SupabaseError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SupabaseError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                trimmed,
                url.scheme()
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    /// Append a `key=value` query pair, encoding the value.
    pub fn with_query(&self, key: &str, value: &str) -> Self {
        let separator = if self.0.contains('?') { '&' } else { '?' };
        Self(format!(
            "{}{}{}={}",
            self.0,
            separator,
            key,
            urlencoding::encode(value)
        ))
    }

    /// Append a PostgREST column filter, e.g. `user_id=eq.<id>`.
    pub fn with_filter(&self, column: &str, operator: &str, value: &str) -> Self {
        self.with_query(column, &format!("{}.{}", operator, value))
    }
}
