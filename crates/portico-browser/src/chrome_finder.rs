use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming the browser binary
pub const CHROME_ENV: &str = "PORTICO_CHROME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Flag,
    Env,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Flag => "--chrome-path",
            Source::Env => CHROME_ENV,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    Missing,
    NotExecutable,
    Unreadable(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing => f.write_str("missing"),
            Rejection::NotExecutable => f.write_str("not executable"),
            Rejection::Unreadable(e) => write!(f, "unreadable: {}", e),
        }
    }
}

/// Resolves the browser binary for the Chrome surface
///
/// An explicit path wins, then `PORTICO_CHROME`, then the platform's usual
/// install locations. An explicit or environment path that does not work is
/// an error rather than a silent fallback.
pub struct ChromeFinder {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    defaults: Vec<PathBuf>,
}

impl ChromeFinder {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            env: std::env::var_os(CHROME_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            defaults: platform_defaults(),
        }
    }

    #[cfg(test)]
    fn with_candidates(
        explicit: Option<PathBuf>,
        env: Option<PathBuf>,
        defaults: Vec<PathBuf>,
    ) -> Self {
        Self {
            explicit,
            env,
            defaults,
        }
    }

    pub fn find(&self) -> Result<PathBuf> {
        let pinned = [
            (Source::Flag, self.explicit.as_ref()),
            (Source::Env, self.env.as_ref()),
        ];
        for (source, path) in pinned {
            if let Some(path) = path {
                return check(path).map_err(|why| {
                    Error::Browser(format!(
                        "Chrome from {} at {} is {}",
                        source,
                        path.display(),
                        why
                    ))
                });
            }
        }

        let mut rejected = Vec::new();
        for path in &self.defaults {
            match check(path) {
                Ok(found) => {
                    tracing::debug!("Using Chrome at {}", found.display());
                    return Ok(found);
                }
                Err(why) => rejected.push(format!("{} ({})", path.display(), why)),
            }
        }

        Err(Error::Browser(format!(
            "Chrome not found. Checked: {}. Use --chrome-path or {} to specify location.",
            if rejected.is_empty() {
                "nothing for this platform".to_string()
            } else {
                rejected.join(", ")
            },
            CHROME_ENV
        )))
    }
}

fn check(path: &Path) -> std::result::Result<PathBuf, Rejection> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Rejection::Missing),
        Err(e) => return Err(Rejection::Unreadable(e.to_string())),
    };
    if !metadata.is_file() {
        return Err(Rejection::NotExecutable);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Rejection::NotExecutable);
        }
    }

    Ok(path.to_path_buf())
}

fn platform_defaults() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ]
    } else if cfg!(target_os = "linux") {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
    } else {
        &[]
    };
    paths.iter().map(PathBuf::from).collect()
}
