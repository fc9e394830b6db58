use std::process::Command;

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout).ok()
}

fn main() {
    // Builds from a source tarball have no git metadata.
    let commit_hash = git_output(&["rev-parse", "HEAD"])
        .map(|hash| hash.trim().chars().take(9).collect::<String>())
        .unwrap_or_else(|| "unknown".to_owned());
    println!("cargo:rustc-env=COMMIT_HASH={}", commit_hash);

    let commit_date = git_output(&["show", "-s", "--format=%cd", "--date=short", "HEAD"])
        .map(|date| date.trim().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());
    println!("cargo:rustc-env=COMMIT_DATE={}", commit_date);
}
