//! AWS SDK implementations of the remote call seam

use crate::api::{
    AutoScalingApi, ClientFactory, Ec2Api, ExcessCapacityPolicy, FleetRecord, LaunchWeight,
    ScalingGroupRecord,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::types::{
    ExcessCapacityTerminationPolicy, FleetExcessCapacityTerminationPolicy,
    TargetCapacitySpecificationRequest,
};
use fleetpool_cloud::{CapacityRequest, Connection, FleetError, Page, Result, RetryConfig};
use std::sync::Arc;

/// Render an SDK error with its full source chain
fn remote_error<E>(err: E) -> FleetError
where
    E: std::error::Error + 'static,
{
    FleetError::RemoteUnavailable(DisplayErrorContext(&err).to_string())
}

/// EC2 answers a describe for an unknown id with `*.NotFound` instead of an
/// empty list. The adapter returns an empty page; callers narrow a short
/// multi-id listing down to the unknown id and add region context.
fn is_not_found_code(code: Option<&str>) -> bool {
    code.is_some_and(|c| c.ends_with(".NotFound"))
}

fn to_capacity(value: Option<i32>) -> u32 {
    u32::try_from(value.unwrap_or(0)).unwrap_or(0)
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| FleetError::invalid(format!("capacity {value} exceeds the supported range")))
}

fn ids_filter(ids: &[String]) -> Option<Vec<String>> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.to_vec())
    }
}

/// Client factory backed by the default AWS credential chain
pub struct SdkClientFactory {
    retry: RetryConfig,
}

impl SdkClientFactory {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    async fn sdk_config(&self, conn: &Connection) -> SdkConfig {
        let retry = aws_config::retry::RetryConfig::standard()
            .with_max_attempts(self.retry.max_attempts)
            .with_initial_backoff(self.retry.initial_delay)
            .with_max_backoff(self.retry.max_delay);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(conn.region.clone()))
            .retry_config(retry);

        if let Some(profile) = &conn.credentials_ref {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &conn.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        tracing::debug!(
            region = %conn.region,
            profile = ?conn.credentials_ref,
            endpoint = ?conn.endpoint,
            "Loading AWS config"
        );
        loader.load().await
    }
}

impl Default for SdkClientFactory {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[async_trait]
impl ClientFactory for SdkClientFactory {
    async fn ec2(&self, conn: &Connection) -> Result<Arc<dyn Ec2Api>> {
        let config = self.sdk_config(conn).await;
        Ok(Arc::new(SdkEc2 {
            client: aws_sdk_ec2::Client::new(&config),
        }))
    }

    async fn auto_scaling(&self, conn: &Connection) -> Result<Arc<dyn AutoScalingApi>> {
        let config = self.sdk_config(conn).await;
        Ok(Arc::new(SdkAutoScaling {
            client: aws_sdk_autoscaling::Client::new(&config),
        }))
    }
}

/// EC2 client wrapper
pub struct SdkEc2 {
    client: aws_sdk_ec2::Client,
}

#[async_trait]
impl Ec2Api for SdkEc2 {
    async fn describe_spot_fleet_requests(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>> {
        let output = match self
            .client
            .describe_spot_fleet_requests()
            .set_spot_fleet_request_ids(ids_filter(ids))
            .set_next_token(next_token)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if !ids.is_empty() && is_not_found_code(err.code()) => {
                return Ok(Page::last(Vec::new()));
            }
            Err(err) => return Err(remote_error(err)),
        };

        let records = output
            .spot_fleet_request_configs()
            .iter()
            .map(|config| {
                let data = config.spot_fleet_request_config();
                let mut launch_weights: Vec<LaunchWeight> = data
                    .map(|d| d.launch_specifications())
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|spec| {
                        spec.instance_type()
                            .map(|t| LaunchWeight::new(t.as_str(), spec.weighted_capacity()))
                    })
                    .collect();
                launch_weights.extend(
                    data.map(|d| d.launch_template_configs())
                        .unwrap_or_default()
                        .iter()
                        .flat_map(|c| c.overrides())
                        .filter_map(|o| {
                            o.instance_type()
                                .map(|t| LaunchWeight::new(t.as_str(), o.weighted_capacity()))
                        }),
                );

                FleetRecord {
                    id: config.spot_fleet_request_id().unwrap_or_default().to_string(),
                    state: config
                        .spot_fleet_request_state()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                    fleet_type: data
                        .and_then(|d| d.r#type())
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    target_capacity: to_capacity(data.and_then(|d| d.target_capacity())),
                    launch_weights,
                }
            })
            .collect();

        Ok(Page::new(records, output.next_token().map(str::to_string)))
    }

    async fn describe_spot_fleet_instances(
        &self,
        request_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .describe_spot_fleet_instances()
            .spot_fleet_request_id(request_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(remote_error)?;

        let instance_ids = output
            .active_instances()
            .iter()
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();

        Ok(Page::new(instance_ids, output.next_token().map(str::to_string)))
    }

    async fn modify_spot_fleet_request(
        &self,
        request_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        let policy = match policy {
            ExcessCapacityPolicy::Default => ExcessCapacityTerminationPolicy::Default,
            ExcessCapacityPolicy::NoTermination => ExcessCapacityTerminationPolicy::NoTermination,
        };

        self.client
            .modify_spot_fleet_request()
            .spot_fleet_request_id(request_id)
            .target_capacity(to_i32(target_capacity)?)
            .excess_capacity_termination_policy(policy)
            .send()
            .await
            .map_err(remote_error)?;
        Ok(())
    }

    async fn describe_fleets(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>> {
        let output = match self
            .client
            .describe_fleets()
            .set_fleet_ids(ids_filter(ids))
            .set_next_token(next_token)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if !ids.is_empty() && is_not_found_code(err.code()) => {
                return Ok(Page::last(Vec::new()));
            }
            Err(err) => return Err(remote_error(err)),
        };

        let records = output
            .fleets()
            .iter()
            .map(|fleet| FleetRecord {
                id: fleet.fleet_id().unwrap_or_default().to_string(),
                state: fleet
                    .fleet_state()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                fleet_type: fleet
                    .r#type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
                target_capacity: to_capacity(
                    fleet
                        .target_capacity_specification()
                        .and_then(|t| t.total_target_capacity()),
                ),
                launch_weights: fleet
                    .launch_template_configs()
                    .iter()
                    .flat_map(|c| c.overrides())
                    .filter_map(|o| {
                        o.instance_type()
                            .map(|t| LaunchWeight::new(t.as_str(), o.weighted_capacity()))
                    })
                    .collect(),
            })
            .collect();

        Ok(Page::new(records, output.next_token().map(str::to_string)))
    }

    async fn describe_fleet_instances(
        &self,
        fleet_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .describe_fleet_instances()
            .fleet_id(fleet_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(remote_error)?;

        let instance_ids = output
            .active_instances()
            .iter()
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();

        Ok(Page::new(instance_ids, output.next_token().map(str::to_string)))
    }

    async fn modify_fleet(
        &self,
        fleet_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        let policy = match policy {
            ExcessCapacityPolicy::Default => FleetExcessCapacityTerminationPolicy::Termination,
            ExcessCapacityPolicy::NoTermination => {
                FleetExcessCapacityTerminationPolicy::NoTermination
            }
        };
        let capacity = TargetCapacitySpecificationRequest::builder()
            .total_target_capacity(to_i32(target_capacity)?)
            .build();

        self.client
            .modify_fleet()
            .fleet_id(fleet_id)
            .target_capacity_specification(capacity)
            .excess_capacity_termination_policy(policy)
            .send()
            .await
            .map_err(remote_error)?;
        Ok(())
    }

    async fn describe_regions(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(remote_error)?;

        Ok(output
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(str::to_string))
            .collect())
    }
}

/// Auto Scaling client wrapper
pub struct SdkAutoScaling {
    client: aws_sdk_autoscaling::Client,
}

#[async_trait]
impl AutoScalingApi for SdkAutoScaling {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<Page<ScalingGroupRecord>> {
        let output = self
            .client
            .describe_auto_scaling_groups()
            .set_auto_scaling_group_names(ids_filter(names))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(remote_error)?;

        let groups = output
            .auto_scaling_groups()
            .iter()
            .map(|group| ScalingGroupRecord {
                name: group.auto_scaling_group_name().unwrap_or_default().to_string(),
                status: group.status().map(str::to_string),
                desired_capacity: to_capacity(group.desired_capacity()),
                min_size: to_capacity(group.min_size()),
                max_size: to_capacity(group.max_size()),
                instance_ids: group
                    .instances()
                    .iter()
                    .filter_map(|i| i.instance_id().map(str::to_string))
                    .collect(),
            })
            .collect();

        Ok(Page::new(groups, output.next_token().map(str::to_string)))
    }

    async fn update_auto_scaling_group(
        &self,
        name: &str,
        request: CapacityRequest,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        self.client
            .update_auto_scaling_group()
            .auto_scaling_group_name(name)
            .min_size(to_i32(request.min)?)
            .max_size(to_i32(request.max)?)
            .desired_capacity(to_i32(request.target)?)
            .new_instances_protected_from_scale_in(policy == ExcessCapacityPolicy::NoTermination)
            .send()
            .await
            .map_err(remote_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        assert!(is_not_found_code(Some("InvalidSpotFleetRequestId.NotFound")));
        assert!(is_not_found_code(Some("InvalidFleetId.NotFound")));
        assert!(!is_not_found_code(Some("RequestLimitExceeded")));
        assert!(!is_not_found_code(None));
    }

    #[test]
    fn test_capacity_conversion() {
        assert_eq!(to_capacity(Some(4)), 4);
        assert_eq!(to_capacity(None), 0);
        assert_eq!(to_capacity(Some(-1)), 0);
        assert_eq!(to_i32(7).unwrap(), 7);
        assert!(to_i32(u32::MAX).is_err());
    }

    #[test]
    fn test_ids_filter() {
        assert_eq!(ids_filter(&[]), None);
        assert_eq!(
            ids_filter(&["sfr-1".to_string()]),
            Some(vec!["sfr-1".to_string()])
        );
    }
}
