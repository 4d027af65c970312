use anyhow::Context as _;
use warpgrid_nomination::PlanSnapshot;
use warpgrid_state::AnnotationPatch;

use super::Context;

pub fn show(ctx: &Context, node: &str) -> anyhow::Result<()> {
    let record = ctx
        .store
        .get_node(node)?
        .with_context(|| format!("node {node} not found"))?;

    let Some(raw) = record.annotation(ctx.plan_annotation()) else {
        println!("node {node} has no plan");
        return Ok(());
    };
    let plan = PlanSnapshot::decode(raw)
        .with_context(|| format!("node {node} carries an unreadable plan: {raw}"))?;

    if plan.is_empty() {
        println!("node {node} has an empty plan");
        return Ok(());
    }
    for (key, quota) in plan.iter() {
        println!("{key} {quota}");
    }
    Ok(())
}

pub fn set(ctx: &Context, node: &str, raw: &str) -> anyhow::Result<()> {
    let plan = PlanSnapshot::decode(raw).context("refusing to store plan")?;
    let mut patch = AnnotationPatch::new();
    // An empty plan clears the annotation.
    let value = if plan.is_empty() { None } else { Some(plan.encode()?) };
    patch.insert(ctx.plan_annotation().to_string(), value);

    let updated = ctx.store.patch_node_annotations(node, &patch, None)?;
    tracing::info!(
        node = %node,
        entries = plan.len(),
        version = updated.resource_version,
        "plan written"
    );
    println!("✓ plan on {node} set ({} entries)", plan.len());
    Ok(())
}
