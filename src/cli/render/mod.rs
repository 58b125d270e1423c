//! Render command - renders a prompt, optionally in a subject's context

use clap::Args;

use crate::domain::{ProjectId, SubjectId};
use crate::infrastructure::services::ExpandRequest;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Prompt name
    pub name: String,

    /// Version label; the pinned or most recent version otherwise
    #[arg(long)]
    pub version: Option<String>,

    /// Bindings as a JSON object
    #[arg(long)]
    pub input: Option<String>,

    /// Apply this subject's effective policies and objectives
    #[arg(long)]
    pub subject: Option<String>,

    /// Project scope for policies and objectives
    #[arg(long, requires = "subject")]
    pub project: Option<String>,
}

pub async fn run(args: RenderArgs, state: &crate::AppState) -> anyhow::Result<()> {
    let mut request =
        ExpandRequest::new(args.name).with_bindings(super::parse_bindings(args.input.as_deref())?);

    if let Some(version) = args.version {
        request = request.with_version(version);
    }
    if let Some(subject) = args.subject {
        request = request.with_subject(SubjectId::new(subject)?);
    }
    if let Some(project) = args.project {
        request = request.with_project(ProjectId::new(project)?);
    }

    let result = state.context_service.expand(request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
