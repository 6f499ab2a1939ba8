use serde::Serialize;

/// Progress of the running or last finished rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStatus {
    pub is_processing: bool,
    pub message: String,
}

impl ProcessingStatus {
    pub fn starting() -> Self {
        Self {
            is_processing: true,
            message: "Starting directory processing...".to_string(),
        }
    }

    pub fn processing(name: &str) -> Self {
        Self {
            is_processing: true,
            message: format!("Processing {name}..."),
        }
    }

    pub fn complete(processed: usize, skipped: usize) -> Self {
        Self {
            is_processing: false,
            message: format!(
                "Processing complete! {processed} celebrities processed, {skipped} skipped."
            ),
        }
    }

    pub fn failed(error: &impl std::fmt::Display) -> Self {
        Self {
            is_processing: false,
            message: format!("Error: {error}"),
        }
    }
}
