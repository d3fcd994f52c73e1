//! TOML deep merge.

use toml::{Table, Value};

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(overlay_table) => {
                if let Some(Value::Table(base_table)) = base.get_mut(&key) {
                    merge_tables(base_table, overlay_table);
                } else {
                    base.insert(key, Value::Table(overlay_table));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Parse both documents, merge `overlay` over `base` and serialize the
/// result.
pub fn merge_toml(base: &str, overlay: &str) -> Result<String, String> {
    let mut base: Table = base
        .parse()
        .map_err(|e: toml::de::Error| format!("existing config: {}", e.message()))?;
    let overlay: Table = overlay
        .parse()
        .map_err(|e: toml::de::Error| format!("rendered template: {}", e.message()))?;
    merge_tables(&mut base, overlay);
    toml::to_string(&base).map_err(|e| e.to_string())
}
