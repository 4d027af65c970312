use warpgrid_nomination::{AdmitOutcome, PlacementExtension, WorkloadInstance};

use super::Context;

pub fn score(ctx: &Context, instance: &WorkloadInstance, node: &str) -> anyhow::Result<()> {
    let score = ctx.plugin.score(instance, node)?;
    println!("{score}");
    Ok(())
}

pub fn admit(ctx: &Context, instance: &WorkloadInstance, node: &str) -> anyhow::Result<()> {
    match ctx.plugin.admit(instance, node)? {
        AdmitOutcome::NoPlan => println!("allowed: node {node} has no plan"),
        AdmitOutcome::NoMatch => println!("allowed: instance not in plan for {node}"),
        AdmitOutcome::Admitted { consumed, exhausted, .. } => {
            for key in &consumed {
                println!("consumed {key}");
            }
            for key in &exhausted {
                println!("exhausted {key}");
            }
            println!("allowed: plan on {node} updated");
        }
    }
    Ok(())
}
