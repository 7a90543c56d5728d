pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

use propinvest_core::PolicyConfig;

/// Resolve a command's input: `--input` file first, then piped stdin.
/// Returns `None` when neither is present so flags can be used instead.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_structured(path)?));
    }
    stdin::read_stdin()
}

/// Load the tax and solver policy from `--policy`, or the built-in UK
/// defaults when no file is given.
pub fn load_policy(path: Option<&str>) -> Result<PolicyConfig, Box<dyn std::error::Error>> {
    let policy: PolicyConfig = match path {
        Some(path) => {
            log::info!("loading policy from {path}");
            file::read_structured(path)?
        }
        None => PolicyConfig::default(),
    };
    policy.validate()?;
    Ok(policy)
}
