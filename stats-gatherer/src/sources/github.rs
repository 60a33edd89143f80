use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// The subset of the GitHub repository object the collectors rely on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub stargazers_count: i64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_api_payload() {
        let repo: Repository = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "mise",
                "full_name": "jdx/mise",
                "stargazers_count": 9000,
                "archived": false,
                "fork": false,
                "pushed_at": "2025-01-15T10:00:00Z",
                "owner": {"login": "jdx"}
            }"#,
        )
        .unwrap();

        assert_eq!(repo.full_name, "jdx/mise");
        assert_eq!(repo.stargazers_count, 9000);
        assert_eq!(repo.pushed_at.unwrap().to_rfc3339(), "2025-01-15T10:00:00+00:00");
    }
}
