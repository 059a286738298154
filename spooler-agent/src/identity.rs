//! Agent identity
//!
//! Every agent claims jobs under `<base id>-<suffix>`. The suffix is random,
//! generated on first start and persisted in the state directory so that the
//! identity survives restarts. Two machines configured with the same base id
//! still claim under different identities.

use std::io;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// File holding the persisted suffix
pub const SUFFIX_FILE: &str = "unique-agent-id";

/// Resolves the identity written to `claimed_by`
///
/// Never fails: when the suffix cannot be read or persisted, a timestamp
/// suffix is used for this process only.
pub fn resolve_unique_agent_id(base_id: &str, state_dir: &Path) -> String {
    match load_or_create_suffix(state_dir) {
        Ok(suffix) => format!("{}-{}", base_id, suffix),
        Err(e) => {
            warn!(
                "Failed to persist agent id suffix in {}: {}; using a timestamp suffix",
                state_dir.display(),
                e
            );
            format!("{}-{}", base_id, chrono::Utc::now().timestamp_millis())
        }
    }
}

fn load_or_create_suffix(state_dir: &Path) -> io::Result<String> {
    let path = state_dir.join(SUFFIX_FILE);

    match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.trim().is_empty() => {
            debug!("Loaded agent id suffix from {}", path.display());
            return Ok(contents.trim().to_string());
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    std::fs::create_dir_all(state_dir)?;
    let suffix = Uuid::new_v4().to_string();
    std::fs::write(&path, &suffix)?;
    debug!("Generated agent id suffix at {}", path.display());

    Ok(suffix)
}

/// Checks the shape of a base agent id
///
/// 3 to 50 characters, starting with a letter or digit, then letters,
/// digits, hyphens and underscores.
pub fn validate_agent_id(agent_id: &str) -> Result<(), String> {
    if agent_id.is_empty() {
        return Err("Agent ID is required".to_string());
    }

    let mut chars = agent_id.chars();
    let starts_well = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !starts_well || !rest_ok {
        return Err("Agent ID must start with a letter or number and can only contain letters, numbers, hyphens, and underscores".to_string());
    }

    if !(3..=50).contains(&agent_id.len()) {
        return Err("Agent ID must be between 3 and 50 characters".to_string());
    }

    Ok(())
}
