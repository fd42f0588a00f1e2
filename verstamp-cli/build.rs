// Build script to inject version information from git tags
//
// Falls back to CARGO_PKG_VERSION when git is unavailable or there is no tag.

use std::process::Command;

fn main() {
    let version = get_git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=VERSTAMP_VERSION={}", version);
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads");
    println!("cargo:rerun-if-changed=../.git/refs/tags");
}

fn get_git_version() -> Option<String> {
    // Something like "v0.1.0", "v0.1.0-5-gabc123" or "v0.1.0-5-gabc123-dirty"
    let output = Command::new("git")
        .args(["describe", "--tags", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let tag = described.trim().strip_prefix('v')?;

    // Clean tag: "0.1.0". Otherwise keep the commit suffix for dev builds.
    match tag.split_once('-') {
        None => Some(tag.to_string()),
        Some((base, rest)) => Some(format!("{}+{}", base, rest.replace('-', "."))),
    }
}
