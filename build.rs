// Build script - runs at compile time
use std::process::Command;

fn main() {
    // Get git commit hash (short)
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .unwrap_or_else(|| "unknown".to_string());
    let commit = commit.trim();
    let commit = if commit.is_empty() { "unknown" } else { commit };

    // Pass to compiler as environment variable
    println!("cargo:rustc-env=BUILD_COMMIT={}", commit);
}
