use anyhow::Result;

use hostkit::app::Host;

pub async fn run_actions(host: &Host) -> Result<()> {
    let actions = host.actions();
    if actions.is_empty() {
        println!("No startup actions registered.");
        return Ok(());
    }

    println!("Startup actions in execution order:");
    for (i, descriptor) in actions.iter().enumerate() {
        let priority = if descriptor.is_last() {
            "last".to_string()
        } else {
            descriptor.priority().to_string()
        };
        println!("  {}. {} (priority {})", i + 1, descriptor.name(), priority);
    }

    Ok(())
}
