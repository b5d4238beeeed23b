use serde::Deserialize;
use time::OffsetDateTime;

/// Request body for creating a promise.
#[derive(Debug, Deserialize)]
pub struct CreatePromiseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

/// Request body for updating a promise's status and/or progress.
#[derive(Debug, Deserialize)]
pub struct UpdatePromiseRequest {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub progress: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_minimal_body() {
        let req: CreatePromiseRequest =
            serde_json::from_str(r#"{"title":"run 5k","deadline":"2026-09-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(req.title.as_deref(), Some("run 5k"));
        assert!(req.deadline.is_some());
        assert!(req.description.is_none());
        assert!(req.category.is_none());
        assert!(req.is_public.is_none());
    }

    #[test]
    fn create_request_tolerates_missing_required_fields() {
        // presence is validated in the handler so the API can answer 400
        let req: CreatePromiseRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert!(req.deadline.is_none());
    }

    #[test]
    fn update_request_parses_partial_patch() {
        let req: UpdatePromiseRequest =
            serde_json::from_str(r#"{"id":7,"progress":55}"#).unwrap();
        assert_eq!(req.id, Some(7));
        assert_eq!(req.status, None);
        assert_eq!(req.progress, Some(55));
    }
}
