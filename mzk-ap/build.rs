//! Stamps the mzk-ap binary with the revision and time it was built from

use std::process::Command;

/// `git describe` of the workspace, `None` outside a checkout
fn source_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    Some(revision.trim().to_owned()).filter(|r| !r.is_empty())
}

fn main() {
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");

    let revision = source_revision().unwrap_or_else(|| "untracked".to_owned());
    let built_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_owned());

    println!("cargo:rustc-env=MZK_SOURCE_REVISION={revision}");
    println!("cargo:rustc-env=MZK_BUILT_AT={built_at}");
    println!("cargo:rustc-env=MZK_BUILD_PROFILE={profile}");
}
