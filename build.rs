use std::process::Command;

/// Exposes `JWTREVOKE_VERSION`: the package version, tagged with the commit
/// (`+g<hash>`) and a `.dirty` marker when built from a modified checkout.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let mut version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    if let Some(commit) = git(&["rev-parse", "--short", "HEAD"]) {
        version.push_str("+g");
        version.push_str(&commit);
        if git(&["status", "--porcelain", "--untracked-files=no"]).is_some() {
            version.push_str(".dirty");
        }
    }

    println!("cargo:rustc-env=JWTREVOKE_VERSION={}", version);
}

/// Trimmed stdout of a successful git invocation, `None` when empty or failed.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
