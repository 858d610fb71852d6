use anyhow::Context;
use maestro_core::catalog::Catalog;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = Catalog::load(root).context("failed to load agent catalog")?;

    if json {
        return crate::output::print_json(&catalog.agents().to_vec());
    }

    let rows = catalog
        .agents()
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.display_name.clone(),
                a.category.to_string(),
                a.priority.to_string(),
                a.description.clone(),
            ]
        })
        .collect();
    crate::output::print_table(&["id", "name", "category", "priority", "description"], rows);
    Ok(())
}
