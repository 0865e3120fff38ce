use crate::Context;
use fleetpool_cloud_aws::{SdkClientFactory, available_regions};

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    let factory = SdkClientFactory::new(ctx.config.retry_config());
    let regions = available_regions(&factory, ctx.conn.credentials_ref.as_deref()).await;

    for region in regions {
        println!("{region}");
    }
    Ok(())
}
