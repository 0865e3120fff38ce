//! Region lookup
//!
//! Optional enrichment for region pickers. Unlike the backend operations,
//! a failed lookup is not an error: the static list is returned instead.

use crate::api::ClientFactory;
use fleetpool_cloud::Connection;

/// Default region used to ask EC2 for the region list
pub const DEFAULT_REGION: &str = "us-east-1";

/// Regions offered when the account cannot be asked
pub const DEFAULT_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "sa-east-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
];

fn default_regions() -> Vec<String> {
    DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect()
}

/// Region names enabled for the account, sorted
pub async fn available_regions(
    factory: &dyn ClientFactory,
    credentials_ref: Option<&str>,
) -> Vec<String> {
    let mut conn = Connection::new(DEFAULT_REGION);
    conn.credentials_ref = credentials_ref.map(str::to_string);

    let lookup = async {
        let ec2 = factory.ec2(&conn).await?;
        ec2.describe_regions().await
    };

    match lookup.await {
        Ok(regions) if !regions.is_empty() => {
            let mut regions = regions;
            regions.sort();
            regions
        }
        Ok(_) => {
            tracing::warn!("DescribeRegions returned no regions, using defaults");
            default_regions()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to describe regions, using defaults");
            default_regions()
        }
    }
}
