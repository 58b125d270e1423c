//! Context command - shows a subject's effective policies and objectives

use clap::Args;

use crate::domain::{ProjectId, SubjectId};

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Subject id
    pub subject: String,

    /// Project scope
    #[arg(long)]
    pub project: Option<String>,

    /// Print the layered policies as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ContextArgs, state: &crate::AppState) -> anyhow::Result<()> {
    let subject_id = SubjectId::new(args.subject)?;
    let project_id = args.project.map(ProjectId::new).transpose()?;

    if args.json {
        let policies = state
            .context_service
            .resolve_policies(&subject_id, project_id.as_ref())
            .await?;
        println!("{}", serde_json::to_string_pretty(&policies)?);
        return Ok(());
    }

    let text = state
        .registry
        .format_context(&subject_id, project_id.as_ref())
        .await?;
    println!("{}", text);

    Ok(())
}
