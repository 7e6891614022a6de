use std::process::{Command, Stdio};

/// Program and arguments that reveal `path` in the platform file browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RevealCommand {
    #[cfg(target_os = "windows")]
    pub fn for_path(path: &str) -> Self {
        Self::explorer(path)
    }

    #[cfg(target_os = "macos")]
    pub fn for_path(path: &str) -> Self {
        Self {
            program: "open".to_string(),
            args: vec!["-R".to_string(), path.to_string()],
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    pub fn for_path(path: &str) -> Self {
        Self::xdg_open_parent(path)
    }

    /// `explorer /select, <path>` with backslash separators
    pub fn explorer(path: &str) -> Self {
        let windows_path = path.trim_end_matches('/').replace('/', "\\");
        Self {
            program: "explorer".to_string(),
            args: vec!["/select,".to_string(), windows_path],
        }
    }

    /// `xdg-open` cannot select an entry, so open the containing directory
    pub fn xdg_open_parent(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(0) => "/",
            Some(index) => &trimmed[..index],
            None => ".",
        };
        Self {
            program: "xdg-open".to_string(),
            args: vec![parent.to_string()],
        }
    }
}

/// Open the OS file browser at `path`'s location without waiting for it
pub fn open_file_location(path: &str) -> std::io::Result<()> {
    let reveal = RevealCommand::for_path(path);
    tracing::debug!("Revealing {} via {} {:?}", path, reveal.program, reveal.args);

    Command::new(&reveal.program)
        .args(&reveal.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
