use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{LcFindError, LcFindResult};
use crate::inventory::{parse_describe_output, InventoryClient, LaunchConfigurationRecord};

const SOURCE_NAME: &str = "aws-cli";

/// Inventory backed by `aws autoscaling describe-launch-configurations`.
pub struct AwsCliInventory {
    program: String,
    profile: Option<String>,
}

impl AwsCliInventory {
    pub fn new(profile: Option<String>) -> Self {
        Self::with_program("aws", profile)
    }

    pub fn with_program(program: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            program: program.into(),
            profile,
        }
    }

    fn command_args(&self, region: &str) -> Vec<String> {
        let mut args = vec![
            "autoscaling".to_string(),
            "describe-launch-configurations".to_string(),
            "--region".to_string(),
            region.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

#[async_trait]
impl InventoryClient for AwsCliInventory {
    async fn fetch(&self, region: &str) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
        let args = self.command_args(region);
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                LcFindError::external(SOURCE_NAME, format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LcFindError::external(
                SOURCE_NAME,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        parse_describe_output(SOURCE_NAME, &String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let inventory = AwsCliInventory::new(None);
        assert_eq!(
            inventory.command_args("eu-west-1"),
            vec![
                "autoscaling",
                "describe-launch-configurations",
                "--region",
                "eu-west-1",
                "--output",
                "json"
            ]
        );

        let inventory = AwsCliInventory::new(Some("ops".to_string()));
        let args = inventory.command_args("eu-west-1");
        assert_eq!(&args[args.len() - 2..], &["--profile", "ops"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_external_error() {
        let inventory = AwsCliInventory::with_program("lcfind-no-such-binary", None);
        let err = inventory.fetch("us-east-1").await.unwrap_err();
        assert!(matches!(err, LcFindError::ExternalSource { .. }));
        assert!(err.to_string().contains("failed to run"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_external_error() {
        let inventory = AwsCliInventory::with_program("false", None);
        let err = inventory.fetch("us-east-1").await.unwrap_err();
        assert!(matches!(err, LcFindError::ExternalSource { .. }));
        assert!(err.to_string().contains("exited with"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_json_stdout_is_external_error() {
        // echo prints its arguments back, which is not JSON
        let inventory = AwsCliInventory::with_program("echo", None);
        let err = inventory.fetch("us-east-1").await.unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }
}
