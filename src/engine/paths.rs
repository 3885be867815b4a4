//! Host-to-sandbox path translation
//!
//! Maps a host filesystem path to the path at which it is mounted inside an
//! execution sandbox. Drive-letter paths follow the WSL-style `/mnt/<drive>`
//! convention; POSIX paths pass through normalized. Relative paths resolve
//! against the current working directory before translation.

use std::path::Path;

/// Translate a host path into its sandbox mount path.
///
/// Never fails for a syntactically valid path. Relative inputs need a
/// resolvable current directory, which `RunnerConfig::validate` checks at
/// startup; should it become unobtainable afterwards the input is translated
/// as given.
pub fn container_path(host_path: &str) -> String {
    if let Some(translated) = drive_letter_path(host_path) {
        return translated;
    }

    if host_path.starts_with('/') {
        return normalize(host_path);
    }

    match std::env::current_dir() {
        Ok(cwd) => {
            let joined = Path::new(&cwd).join(host_path);
            let joined = joined.to_string_lossy();
            match drive_letter_path(&joined) {
                Some(translated) => translated,
                None => normalize(&joined),
            }
        }
        Err(_) => normalize(host_path),
    }
}

/// Translate `C:\Users\act` style paths to `/mnt/c/Users/act`
fn drive_letter_path(path: &str) -> Option<String> {
    let mut chars = path.chars();
    let drive = chars.next()?;
    if !drive.is_ascii_alphabetic() || chars.next()? != ':' {
        return None;
    }

    let rest: String = chars.collect();
    if !rest.is_empty() && !rest.starts_with('/') && !rest.starts_with('\\') {
        return None;
    }

    let mapped = format!(
        "/mnt/{}/{}",
        drive.to_ascii_lowercase(),
        rest.replace('\\', "/")
    );
    Some(normalize(&mapped))
}

/// Collapse separators and dot components; trailing separators are
/// insignificant.
fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", joined)
    }
}
