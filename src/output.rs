//! JSON result envelope handed back to the automation framework.

use serde::Serialize;

use crate::error::LcFindResult;
use crate::inventory::LaunchConfigurationRecord;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ModuleResult {
    Success {
        changed: bool,
        results: Vec<LaunchConfigurationRecord>,
    },
    Failure {
        failed: bool,
        msg: String,
    },
}

impl ModuleResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<LcFindResult<Vec<LaunchConfigurationRecord>>> for ModuleResult {
    fn from(outcome: LcFindResult<Vec<LaunchConfigurationRecord>>) -> Self {
        match outcome {
            Ok(results) => Self::Success {
                changed: false,
                results,
            },
            Err(e) => Self::Failure {
                failed: true,
                msg: e.to_string(),
            },
        }
    }
}
