use crate::Context;
use std::collections::BTreeMap;

pub async fn handle(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let backend = ctx.registry.resolve(id);
    tracing::debug!(fleet_id = id, kind = %backend.kind(), "Reading fleet state");

    let snapshot = backend.get_state(&ctx.conn, id).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub async fn handle_batch(ctx: &Context, ids: &[String]) -> anyhow::Result<()> {
    let states = ctx.registry.get_state_batch(&ctx.conn, ids).await?;

    // 出力を安定させるためにid順に並べる
    let sorted: BTreeMap<_, _> = states.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);
    Ok(())
}
