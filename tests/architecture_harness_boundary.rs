use std::fs;
use std::path::{Path, PathBuf};

/// Lifecycle calls the command harness must never make.
const LIFECYCLE_CALLS: &[&str] = &[".start()", ".set_config(", "instance.bind_policy("];

fn collect_rust_files(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out);
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

#[test]
fn harness_never_drives_component_lifecycle() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    collect_rust_files(&repo_root.join("src/harness"), &mut files);
    files.push(repo_root.join("src/lifetime.rs"));
    assert!(files.len() > 1, "harness sources not found");

    let mut offenders = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(repo_root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(&file).unwrap_or_default();
        // Unit tests build their own fixtures.
        let body = content.split("#[cfg(test)]").next().unwrap_or_default();
        for (idx, line) in body.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") {
                continue;
            }
            if LIFECYCLE_CALLS.iter().any(|call| line.contains(call)) {
                offenders.push(format!("{rel}:{}: {}", idx + 1, line.trim()));
            }
        }
    }

    assert!(
        offenders.is_empty(),
        "command harness must only dispatch to components:\n{}",
        offenders.join("\n")
    );
}
