use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (chosen by extension) into a typed struct.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let value: T = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use propinvest_core::PolicyConfig;
    use rust_decimal_macros::dec;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("propinvest-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_yaml_policy_overrides_defaults() {
        let path = write_temp(
            "policy.yaml",
            "corporation_tax:\n  main_rate_pct: 26\nsolver:\n  max_iterations: 60\n",
        );
        let policy: PolicyConfig = read_structured(&path).unwrap();
        assert_eq!(policy.corporation_tax.main_rate_pct, dec!(26));
        assert_eq!(policy.corporation_tax.small_profits_rate_pct, dec!(19));
        assert_eq!(policy.solver.max_iterations, 60);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_json_policy_matches_yaml() {
        let json = write_temp("policy.json", r#"{ "solver": { "max_iterations": 60 } }"#);
        let yaml = write_temp("policy.yml", "solver:\n  max_iterations: 60\n");
        let a: PolicyConfig = read_structured(&json).unwrap();
        let b: PolicyConfig = read_structured(&yaml).unwrap();
        assert_eq!(a, b);
        let _ = fs::remove_file(json);
        let _ = fs::remove_file(yaml);
    }

    #[test]
    fn test_missing_file_reported() {
        let err = read_structured::<PolicyConfig>("/nonexistent/policy.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
