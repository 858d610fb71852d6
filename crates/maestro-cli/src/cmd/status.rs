use maestro_core::state::StateRecorder;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateRecorder::new(root).load();

    if json {
        return crate::output::print_json(&state);
    }

    println!("Status:           {}", state.status);
    println!(
        "Current agent:    {}",
        state.current_agent.as_deref().unwrap_or("-")
    );
    println!(
        "Current task:     {}",
        state.current_task.as_deref().unwrap_or("-")
    );
    println!(
        "Progress:         {}% ({}/{} agents)",
        state.progress, state.agents_completed, state.total_agents
    );
    println!("Last updated:     {}", state.last_updated.to_rfc3339());
    Ok(())
}
