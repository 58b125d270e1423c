//! Run command - runs a workflow and prints every step result

use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow id
    pub workflow: String,

    /// Workflow input as JSON; objects become bindings, anything else is bound as `input`
    #[arg(long)]
    pub input: Option<String>,
}

pub async fn run(args: RunArgs, state: &crate::AppState) -> anyhow::Result<()> {
    let input = super::parse_json_input(args.input.as_deref())?;

    let result = state.workflow_service.run(&args.workflow, input).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(failed) = result.failed_step() {
        anyhow::bail!(
            "Step '{}' failed: {}",
            failed.step_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
