//! Game process liveness lookup, one implementation per platform

use std::process::{Command, Stdio};

/// Answers "is any of these processes running right now"
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, candidates: &[String]) -> bool;
}

/// Executable names the game runs under on this OS
pub fn default_process_names() -> Vec<String> {
    let names: &[&str] = if cfg!(target_os = "windows") {
        &["bg3.exe", "bg3_dx11.exe"]
    } else if cfg!(target_os = "macos") {
        &["Baldur's Gate 3"]
    } else {
        &["bg3", "bg3.bin"]
    };
    names.iter().map(|s| s.to_string()).collect()
}

/// `pgrep -x` based lookup
#[cfg(unix)]
#[derive(Default)]
pub struct PgrepProbe;

#[cfg(unix)]
impl ProcessProbe for PgrepProbe {
    fn is_running(&self, candidates: &[String]) -> bool {
        candidates.iter().any(|name| {
            // pgrep matches against the kernel comm name, truncated to 15 chars
            let pattern: String = name.chars().take(15).collect();
            Command::new("pgrep")
                .arg("-x")
                .arg(&pattern)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
    }
}

/// `tasklist` based lookup
#[cfg(windows)]
#[derive(Default)]
pub struct TasklistProbe;

#[cfg(windows)]
impl ProcessProbe for TasklistProbe {
    fn is_running(&self, candidates: &[String]) -> bool {
        candidates.iter().any(|name| {
            Command::new("tasklist")
                .args(["/FI", &format!("IMAGENAME eq {}", name), "/NH", "/FO", "CSV"])
                .stderr(Stdio::null())
                .output()
                .map(|o| tasklist_lists(&String::from_utf8_lossy(&o.stdout), name))
                .unwrap_or(false)
        })
    }
}

/// tasklist prints an INFO line instead of a row when nothing matches
#[cfg_attr(not(windows), allow(dead_code))]
fn tasklist_lists(output: &str, name: &str) -> bool {
    let quoted = format!("\"{}\"", name.to_lowercase());
    output
        .lines()
        .any(|line| line.to_lowercase().starts_with(&quoted))
}

/// Probe for the platform this binary was built for
pub fn platform_probe() -> Box<dyn ProcessProbe> {
    #[cfg(unix)]
    {
        Box::new(PgrepProbe)
    }
    #[cfg(windows)]
    {
        Box::new(TasklistProbe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_are_not_empty() {
        assert!(!default_process_names().is_empty());
    }

    #[test]
    fn tasklist_row_detection() {
        let hit = "\"bg3.exe\",\"4242\",\"Console\",\"1\",\"1,024,000 K\"\r\n";
        let miss = "INFO: No tasks are running which match the specified criteria.\r\n";
        assert!(tasklist_lists(hit, "bg3.exe"));
        assert!(tasklist_lists(hit, "BG3.EXE"));
        assert!(!tasklist_lists(miss, "bg3.exe"));
        assert!(!tasklist_lists(hit, "bg3_dx11.exe"));
    }

    #[cfg(unix)]
    #[test]
    fn pgrep_does_not_find_nonsense() {
        let probe = PgrepProbe;
        assert!(!probe.is_running(&["no-such-proc-zz".to_string()]));
    }
}
