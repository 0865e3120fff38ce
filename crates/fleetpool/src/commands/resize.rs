use crate::Context;
use colored::Colorize;
use fleetpool_cloud::{BackendKind, CapacityRequest, require_id};

/// Bounds for the request; groups overwrite MinSize/MaxSize, so they must be explicit
fn capacity_request(
    kind: BackendKind,
    target: u32,
    min: Option<u32>,
    max: Option<u32>,
) -> anyhow::Result<CapacityRequest> {
    match (kind, min, max) {
        (BackendKind::AutoScalingGroup, Some(min), Some(max)) => {
            Ok(CapacityRequest::new(target, min, max))
        }
        (BackendKind::AutoScalingGroup, _, _) => Err(anyhow::anyhow!(
            "Auto Scaling group resize needs both --min and --max (they replace the group's MinSize and MaxSize)"
        )),
        (_, min, max) => Ok(CapacityRequest::new(
            target,
            min.unwrap_or(0),
            max.unwrap_or(target),
        )),
    }
}

pub async fn handle(
    ctx: &Context,
    id: &str,
    target: u32,
    min: Option<u32>,
    max: Option<u32>,
) -> anyhow::Result<()> {
    require_id(id)?;
    let backend = ctx.registry.resolve(id);
    let request = capacity_request(backend.kind(), target, min, max)?;

    eprintln!(
        "{} {} ({}) → {}",
        "Resizing".blue(),
        id.cyan(),
        backend.kind(),
        target.to_string().bold()
    );

    backend.modify(&ctx.conn, id, request).await?;

    println!("{}", "✓ Resize requested".green());
    Ok(())
}
