use std::env;
use std::process::Command;

/// `RECON_VERSION` is the crate version, plus the short commit when one is known
/// from CI or the local checkout.
fn main() {
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let commit = env::var("GITHUB_SHA")
        .ok()
        .or_else(head_commit)
        .map(|sha| sha.trim().chars().take(7).collect::<String>())
        .filter(|sha| !sha.is_empty());

    match commit {
        Some(commit) => println!("cargo:rustc-env=RECON_VERSION={version} ({commit})"),
        None => println!("cargo:rustc-env=RECON_VERSION={version}"),
    }
}

fn head_commit() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}
