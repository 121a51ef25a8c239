use crate::infra::in_memory_service;
use application_workflow::config::PagingConfig;
use application_workflow::error::AppError;
use application_workflow::workflows::applications::{
    allowed_targets, Application, ApplicationDraft, ApplicationService, ApplicationStatus,
    InMemoryApplicationStore, Revision,
};
use clap::Args;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Name of the demo application.
    #[arg(long, default_value = "new app")]
    pub(crate) name: String,
    /// Body text of the demo application.
    #[arg(long, default_value = "Something")]
    pub(crate) body: String,
    /// Reject the accepted application with this reason instead of publishing it.
    #[arg(long)]
    pub(crate) reject_with: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        name,
        body,
        reject_with,
    } = args;

    println!("Application workflow demo");
    let service = in_memory_service(PagingConfig::default());

    let created = service.create(ApplicationDraft::new(name, body))?;
    print_step(&created);

    let verified = service.verify(created.id)?;
    print_step(&verified);

    if let Err(err) = service.publish(created.id) {
        println!("  Publishing straight from verified is refused: {}", err);
    }

    let accepted = service.accept(created.id)?;
    print_step(&accepted);

    let finished = match reject_with {
        Some(reason) => service.reject(created.id, Some(reason))?,
        None => service.publish(created.id)?,
    };
    print_step(&finished);

    render_audit(&service, &finished)
}

fn print_step(application: &Application) {
    let next: Vec<_> = allowed_targets(application.status)
        .into_iter()
        .map(ApplicationStatus::label)
        .collect();
    let next = if next.is_empty() {
        "none (terminal)".to_string()
    } else {
        next.join(", ")
    };
    println!(
        "- Application {} -> {} | next: {}",
        application.id, application.status, next
    );
}

fn render_audit(
    service: &ApplicationService<InMemoryApplicationStore>,
    application: &Application,
) -> Result<(), AppError> {
    let revisions = service.audit(application.id)?;
    println!("\nAudit trail ({} revisions)", revisions.len());
    for revision in &revisions {
        println!("  {}", describe_revision(revision));
    }

    let entries: Vec<_> = revisions.iter().map(Revision::audit_entry).collect();
    match serde_json::to_string_pretty(&entries) {
        Ok(json) => println!("\nAudit payload:\n{}", json),
        Err(err) => println!("\nAudit payload unavailable: {}", err),
    }

    Ok(())
}

fn describe_revision(revision: &Revision) -> String {
    let snapshot = &revision.application;
    let mut line = format!(
        "#{} {:?} {} at {}",
        revision.revision_number,
        revision.revision_type,
        snapshot.status,
        revision.timestamp.to_rfc3339()
    );
    if let Some(number) = snapshot.application_number {
        line.push_str(&format!(" | number {}", number));
    }
    if let Some(reason) = &snapshot.reason {
        line.push_str(&format!(" | reason \"{}\"", reason));
    }
    line
}
