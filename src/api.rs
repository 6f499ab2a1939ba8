//! JSON shapes of the four operations, as a front-end sends them back.

use serde::Serialize;

use crate::builder::RebuildSummary;
use crate::error::Result;
use crate::matcher::MatchResult;

/// `{"success": true, ..body}` or `{"success": false, "error": ".."}`.
#[derive(Debug, Serialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body: Some(body),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            body: None,
            error: Some(error.to_string()),
        }
    }
}

impl<T, U: From<T>> From<Result<T>> for Reply<U> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Reply::ok(U::from(value)),
            Err(e) => Reply::err(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RebuildBody {
    pub processed_count: usize,
    pub skipped_count: usize,
    pub total_celebrities: usize,
}

impl From<RebuildSummary> for RebuildBody {
    fn from(summary: RebuildSummary) -> Self {
        Self {
            processed_count: summary.processed_count,
            skipped_count: summary.skipped_count(),
            total_celebrities: summary.total_celebrities,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecognizeBody {
    pub matches: Vec<MatchResult>,
}

impl From<Vec<MatchResult>> for RecognizeBody {
    fn from(matches: Vec<MatchResult>) -> Self {
        Self { matches }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_rebuild_reply() {
        let summary = RebuildSummary {
            processed_count: 1,
            skipped: Vec::new(),
            total_celebrities: 1,
        };
        let reply: Reply<RebuildBody> = Reply::from(Ok::<_, Error>(summary));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "success": true,
                "processed_count": 1,
                "skipped_count": 0,
                "total_celebrities": 1
            })
        );
    }

    #[test]
    fn test_recognize_reply() {
        let matches = vec![MatchResult {
            name: "Ada".to_string(),
            distance: 0.5,
            similarity_score: 50.0,
            image_path: PathBuf::from("/lib/Ada/folder.jpg"),
        }];
        let reply: Reply<RecognizeBody> = Reply::from(Ok::<_, Error>(matches));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "success": true,
                "matches": [{
                    "name": "Ada",
                    "distance": 0.5,
                    "similarity_score": 50.0,
                    "image_path": "/lib/Ada/folder.jpg"
                }]
            })
        );
    }

    #[test]
    fn test_error_reply() {
        let reply: Reply<RecognizeBody> = Reply::from(Err::<Vec<MatchResult>, _>(Error::NoFaceDetected));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"success": false, "error": "no face found in the image"})
        );
    }
}
