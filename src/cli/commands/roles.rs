use serde_json::{json, Map, Value};

use crate::acl::{Permission, PermissionTable};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let table = PermissionTable::catalog_default();
    let mut roles: Vec<&str> = table.roles().collect();
    roles.sort_unstable();

    let granted = |role: &str| -> Vec<&'static str> {
        Permission::ALL
            .iter()
            .filter(|permission| table.can_named(role, permission.as_str()))
            .map(|permission| permission.as_str())
            .collect()
    };

    match output_format {
        OutputFormat::Json => {
            let mut map = Map::new();
            for role in &roles {
                map.insert(role.to_string(), json!(granted(role)));
            }
            output_success(&output_format, "Role permissions", Some(json!({ "roles": Value::Object(map) })))
        }
        OutputFormat::Text => {
            for role in &roles {
                println!("{:<10} {}", role, granted(role).join(", "));
            }
            Ok(())
        }
    }
}
