//! Tools and invoke commands - the per-prompt tool surface

use clap::Args;

use crate::domain::{ProjectId, SubjectId};

#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Only list tools matching this text
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Tool name, e.g. `pcp-greet`
    pub tool: String,

    /// Raw input; a JSON object becomes bindings, other text is bound as `input`
    #[arg(default_value = "")]
    pub input: String,

    /// Expand in this subject's context
    #[arg(long)]
    pub subject: Option<String>,

    /// Project scope
    #[arg(long)]
    pub project: Option<String>,
}

pub async fn list(args: ToolsArgs, state: &crate::AppState) -> anyhow::Result<()> {
    let text = match args.search {
        Some(query) => state.registry.format_search(&query).await,
        None => state.registry.format_list().await,
    };
    println!("{}", text);
    Ok(())
}

pub async fn invoke(args: InvokeArgs, state: &crate::AppState) -> anyhow::Result<()> {
    let subject_id = args.subject.map(SubjectId::new).transpose()?;
    let project_id = args.project.map(ProjectId::new).transpose()?;

    let registry = state.registry_for(subject_id).await?;
    let text = registry
        .invoke(&args.tool, &args.input, project_id.as_ref())
        .await?;
    println!("{}", text);

    Ok(())
}
