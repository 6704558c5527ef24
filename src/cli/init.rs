use std::path::Path;

use crate::config::ChatConfig;
use crate::dirs;
use crate::error::Result;

/// Execute the `init` command: write the default configuration file.
pub fn execute(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(dirs::config_path);

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    ChatConfig::default().save_to(&path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set `api_key` under [model] or export A3S_CHAT_API_KEY before serving.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_and_respects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        tokio_test::assert_ok!(execute(Some(&path), false));
        assert!(path.exists());

        std::fs::write(&path, "port = 1234").unwrap();
        execute(Some(&path), false).unwrap();
        assert_eq!(ChatConfig::load_from(&path).unwrap().port, 1234);

        execute(Some(&path), true).unwrap();
        assert_eq!(ChatConfig::load_from(&path).unwrap().port, 8000);
    }
}
