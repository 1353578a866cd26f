//! `get_contact_information`: where guests can reach the business

use super::Tool;
use serde_json::Value;

/// Answers with the configured contact page
pub struct ContactInformationTool {
    url: String,
}

impl ContactInformationTool {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Tool for ContactInformationTool {
    fn name(&self) -> &'static str {
        "get_contact_information"
    }

    fn run(&self, _arguments: &Value) -> String {
        self.url.clone()
    }
}
