//! Check loader - loads check definitions from files

use crate::{CheckDefinition, CheckRegistry};
use scorebeat_core::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Load all checks from a directory
///
/// Definitions that fail to parse or build are logged and skipped.
pub fn load_checks_from_dir(dir: impl AsRef<Path>) -> Result<CheckRegistry> {
    let dir = dir.as_ref();
    let mut registry = CheckRegistry::new();

    if !dir.exists() {
        return Err(Error::FileNotFound {
            path: dir.display().to_string(),
        });
    }

    info!("Loading checks from: {}", dir.display());
    load_recursive(&mut registry, dir)?;

    info!("Loaded {} checks", registry.len());
    Ok(registry)
}

fn load_recursive(registry: &mut CheckRegistry, dir: &Path) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            load_recursive(registry, &path)?;
        } else if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                let loaded = load_definition(&path)
                    .and_then(|def| def.build())
                    .and_then(|check| {
                        let id = check.id().to_string();
                        registry.register(Arc::from(check)).map(|_| id)
                    });

                match loaded {
                    Ok(id) => debug!("Loaded check: {} from {}", id, path.display()),
                    Err(e) => warn!("Failed to load check from {}: {}", path.display(), e),
                }
            }
        }
    }

    Ok(())
}

fn load_definition(path: &Path) -> Result<CheckDefinition> {
    let content = std::fs::read_to_string(path)?;

    CheckDefinition::from_yaml(&content).map_err(|e| Error::InvalidCheckDefinition {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
