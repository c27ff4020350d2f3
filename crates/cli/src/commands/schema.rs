use anyhow::Result;
use kiln_core::configs::project::project_config_schema;

pub fn execute() -> Result<()> {
    let schema = project_config_schema()
        .map_err(|e| anyhow::anyhow!("Failed to generate schema: {}", e))?;
    println!("{}", schema);
    Ok(())
}
