use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_types::region::Region;

pub async fn configure_aws(region: Option<String>, profile: Option<String>) -> aws_types::SdkConfig {
    let region_provider =
        RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();

    let mut loader = aws_config::defaults(BehaviorVersion::v2024_03_28()).region(region_provider);
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_region_wins() {
        let config = configure_aws(Some("eu-central-1".to_string()), None).await;
        assert_eq!(config.region(), Some(&Region::new("eu-central-1")));
    }
}
