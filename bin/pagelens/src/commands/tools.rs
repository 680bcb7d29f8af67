//! List registered tools.

use pagelens_tools::ToolRegistry;

pub fn run(registry: ToolRegistry) -> anyhow::Result<()> {
    let mut schemas = registry.get_tool_schemas();
    schemas.sort_by_key(|s| s["name"].as_str().unwrap_or_default().to_string());

    for schema in schemas {
        let name = schema["name"].as_str().unwrap_or_default();
        let description = schema["description"].as_str().unwrap_or_default();
        println!("{:<18} {}", name, description);
    }
    Ok(())
}
