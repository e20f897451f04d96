use std::process::Command;

/// Trimmed stdout of a successful git command, if it printed anything.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let value = stdout.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn main() {
    // Get git commit hash
    let git_hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());

    // Get git tag (version), or the crate version on an untagged checkout
    let git_tag = git(&["describe", "--tags", "--abbrev=0"])
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    // Get build timestamp
    let build_time = chrono::Utc::now().to_rfc3339();

    // Shown by `retroboard --version`
    println!("cargo:rustc-env=RETROBOARD_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=RETROBOARD_GIT_TAG={}", git_tag);
    println!("cargo:rustc-env=RETROBOARD_BUILD_TIME={}", build_time);

    // Rebuild if git state changes
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
}
