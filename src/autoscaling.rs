use async_trait::async_trait;
use aws_sdk_autoscaling::config::Region;
use aws_sdk_autoscaling::error::DisplayErrorContext;
use aws_sdk_autoscaling::types::LaunchConfiguration;
use aws_sdk_autoscaling::Client as AutoScalingClient;
use aws_types::SdkConfig;
use tracing::debug;

use crate::error::{LcFindError, LcFindResult};
use crate::inventory::{InventoryClient, LaunchConfigurationRecord};

const SOURCE_NAME: &str = "autoscaling";

/// Inventory backed by the Auto Scaling API.
pub struct AutoScalingInventory {
    config: SdkConfig,
}

impl AutoScalingInventory {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }

    fn client_for(&self, region: &str) -> AutoScalingClient {
        let conf = aws_sdk_autoscaling::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .build();
        AutoScalingClient::from_conf(conf)
    }
}

#[async_trait]
impl InventoryClient for AutoScalingInventory {
    async fn fetch(&self, region: &str) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
        list_launch_configurations(&self.client_for(region)).await
    }
}

/// Walk every page of `DescribeLaunchConfigurations`.
pub async fn list_launch_configurations(
    client: &AutoScalingClient,
) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
    let mut pages = client
        .describe_launch_configurations()
        .into_paginator()
        .send();

    let mut records = Vec::new();
    while let Some(page) = pages.next().await {
        let page = page.map_err(|e| {
            LcFindError::external(SOURCE_NAME, DisplayErrorContext(&e).to_string())
        })?;
        records.extend(page.launch_configurations().iter().filter_map(to_record));
    }

    debug!("DescribeLaunchConfigurations returned {} records", records.len());
    Ok(records)
}

fn to_record(lc: &LaunchConfiguration) -> Option<LaunchConfigurationRecord> {
    let name = lc.launch_configuration_name()?;
    let arn = lc.launch_configuration_arn()?;
    Some(LaunchConfigurationRecord::new(name, arn))
}
