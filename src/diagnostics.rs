//! System diagnostics and dependency checking.
//!
//! Verifies that the capture tool, the speech synthesizer, the detector
//! process and the labels file are in place before a run.

use crate::config::Config;
use crate::speech::SpeechBackend;
use crate::vision::labels::LabelMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Present; the string is a short detail for display
    Ok(String),
    /// Not found
    NotFound,
    /// Found but has issues
    Warning(String),
}

/// Locate an executable the way the shell would.
///
/// Names containing a path separator are checked as-is.
pub fn find_in_path(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| {
            let plain = dir.join(command);
            let exe = dir.join(format!("{command}.exe"));
            [plain, exe]
        })
        .find(|path| path.is_file())
}

fn check_command(command: &str) -> CheckResult {
    match find_in_path(command) {
        Some(path) => CheckResult::Ok(path.display().to_string()),
        None => CheckResult::NotFound,
    }
}

/// ffmpeg plus its version banner.
fn check_ffmpeg() -> CheckResult {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let banner = stdout.lines().next().unwrap_or("ffmpeg").to_string();
            CheckResult::Ok(banner)
        }
        Ok(_) => CheckResult::Warning("'ffmpeg' found but -version failed".to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking ffmpeg: {}", e)),
    }
}

fn check_labels(path: &Path) -> CheckResult {
    match LabelMap::load(path) {
        Ok(labels) if labels.is_empty() => CheckResult::Warning("file has no labels".to_string()),
        Ok(labels) => CheckResult::Ok(format!("{} labels", labels.len())),
        Err(crate::error::SeesayError::LabelsNotFound { .. }) => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(e.to_string()),
    }
}

fn print_result(name: &str, result: &CheckResult, install_hint: &[&str]) -> bool {
    print!("{}: ", name);
    match result {
        CheckResult::Ok(detail) => {
            println!("✓ OK ({})", detail);
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            for line in install_hint {
                println!("  {}", line);
            }
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            false
        }
    }
}

/// Run all dependency checks and print results.
///
/// Returns true when everything a run needs is present.
pub fn check_dependencies(config: &Config) -> bool {
    println!("Checking system dependencies...\n");
    let mut all_ok = true;

    all_ok &= print_result(
        "ffmpeg (camera capture)",
        &check_ffmpeg(),
        &[
            "Install: sudo apt install ffmpeg  (Debian/Ubuntu)",
            "         brew install ffmpeg      (macOS)",
        ],
    );

    let backend = config.speech.backend.resolve();
    match backend.tool() {
        Some(tool) => {
            let hint: &[&str] = match backend {
                SpeechBackend::Espeak => &[
                    "Install: sudo apt install espeak  (Debian/Ubuntu)",
                    "         sudo pacman -S espeak-ng (Arch)",
                ],
                _ => &[],
            };
            all_ok &= print_result(
                &format!("{} (speech, backend '{}')", tool, backend),
                &check_command(tool),
                hint,
            );
        }
        None => println!("speech: - silent backend, nothing to check"),
    }

    all_ok &= print_result(
        &format!("{} (detector)", config.detector.command),
        &check_command(&config.detector.command),
        &["Set [detector] command in the config file or SEESAY_DETECTOR"],
    );

    all_ok &= print_result(
        &format!("{} (labels)", config.detector.labels_path.display()),
        &check_labels(&config.detector.labels_path),
        &["Set [detector] labels_path to a coco.names style file"],
    );

    println!();
    if all_ok {
        println!("All dependencies found.");
    } else {
        println!("Some dependencies are missing; see above.");
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_find_in_path_missing_command() {
        assert_eq!(find_in_path("seesay-no-such-tool-12345"), None);
    }

    #[test]
    fn test_find_in_path_explicit_missing_path() {
        assert_eq!(find_in_path("/nonexistent/dir/tool"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_finds_sh() {
        assert!(find_in_path("sh").is_some());
        assert!(matches!(check_command("sh"), CheckResult::Ok(_)));
    }

    #[test]
    fn test_check_labels_missing_file() {
        assert_eq!(
            check_labels(Path::new("/nonexistent/coco.names")),
            CheckResult::NotFound
        );
    }

    #[test]
    fn test_check_labels_counts_entries() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"person\nbicycle\ncar\n").unwrap();
        assert_eq!(
            check_labels(file.path()),
            CheckResult::Ok("3 labels".to_string())
        );
    }

    #[test]
    fn test_check_labels_empty_file_warns() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(check_labels(file.path()), CheckResult::Warning(_)));
    }
}
