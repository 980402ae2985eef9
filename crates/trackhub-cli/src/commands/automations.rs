use anyhow::Result;
use colored::Colorize;

use trackhub_api::{Api, AutomationsFilter};

use crate::cli::{DeleteArgs, ListArgs};
use crate::output::print_success;

pub async fn list(api: &Api, args: &ListArgs) -> Result<()> {
    let filter = AutomationsFilter {
        entity: args.entity.clone(),
        name: args.name.clone(),
        project: None,
        per_page: args.per_page,
    };
    let automations = api.automations(&filter).collect_all().await?;

    if automations.is_empty() {
        println!("No automations found.");
        return Ok(());
    }
    for automation in &automations {
        let status = if automation.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "{}  {}  [{}]  {} {} -> {}",
            automation.id,
            automation.name.cyan(),
            status,
            automation.scope.name().unwrap_or("-"),
            automation.event.event_type,
            automation.action.action_type(),
        );
    }
    Ok(())
}

pub async fn delete(api: &Api, args: &DeleteArgs) -> Result<()> {
    let automation = api.automation(&args.name, args.entity.as_deref()).await?;
    api.delete_automation(&automation.id).await?;
    print_success(&format!("Deleted automation {}", args.name.cyan()));
    Ok(())
}
