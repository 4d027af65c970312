use warpgrid_state::NodeInfo;

use super::Context;

pub fn add(ctx: &Context, node: &str, labels: Vec<(String, String)>) -> anyhow::Result<()> {
    // Keep annotations (and any plan) of an existing node.
    let mut record = ctx.store.get_node(node)?.unwrap_or_else(|| NodeInfo::new(node));
    record.labels = labels.into_iter().collect();
    let version = ctx.store.put_node(&record)?;
    println!("✓ node {node} stored (version {version})");
    Ok(())
}

pub fn list(ctx: &Context) -> anyhow::Result<()> {
    let nodes = ctx.store.list_nodes()?;
    if nodes.is_empty() {
        println!("no nodes");
        return Ok(());
    }
    for node in nodes {
        let plan = if node.annotation(ctx.plan_annotation()).is_some() {
            "plan"
        } else {
            "-"
        };
        println!("{:<24} v{:<6} {}", node.id, node.resource_version, plan);
    }
    Ok(())
}
