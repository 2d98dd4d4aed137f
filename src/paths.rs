use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

pub static PATH_HOME: LazyLock<PathBuf> =
    LazyLock::new(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));

/// Application data directory holding config.json
pub static PATH_APP_DATA: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Ok(dir) = env::var("SAVESYNC_HOME") {
        return PathBuf::from(dir);
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("savesync"),
        None => PATH_HOME.join(".savesync"),
    }
});

/// Where the game keeps its story saves on this OS
pub fn default_save_path() -> PathBuf {
    let game_dir = ["Larian Studios", "Baldur's Gate 3"];
    let profile = ["PlayerProfiles", "Public", "Savegames", "Story"];

    let base = if cfg!(target_os = "windows") {
        dirs::data_local_dir().unwrap_or_else(|| PATH_HOME.join("AppData").join("Local"))
    } else if cfg!(target_os = "macos") {
        PATH_HOME.join("Library").join("Application Support")
    } else {
        PATH_HOME.join(".local").join("share")
    };

    game_dir.iter().chain(profile.iter()).fold(base, |p, seg| p.join(seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_save_path_ends_in_story_dir() {
        let p = default_save_path();
        assert!(p.ends_with(PathBuf::from("Savegames").join("Story")));
        assert!(p.to_string_lossy().contains("Baldur's Gate 3"));
    }
}
