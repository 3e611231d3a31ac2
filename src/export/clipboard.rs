//! Clipboard capability.
//!
//! Export code never touches the OS clipboard directly; it is handed a
//! [`Clipboard`] so tests and headless sessions can substitute a buffer.

use std::future::Future;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::error::{AppError, AppResult};

pub const PNG_MIME: &str = "image/png";

pub trait Clipboard: Send + Sync {
    fn write_image(&self, mime: &str, bytes: &[u8]) -> impl Future<Output = AppResult<()>> + Send;
}

/// In-process clipboard. Holds the most recent write.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<(String, Vec<u8>)>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<(String, Vec<u8>)> {
        self.content.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_image(&self, mime: &str, bytes: &[u8]) -> impl Future<Output = AppResult<()>> + Send {
        let result = self
            .content
            .lock()
            .map(|mut content| {
                *content = Some((mime.to_string(), bytes.to_vec()));
            })
            .map_err(|_| AppError::Clipboard("clipboard buffer poisoned".into()));
        std::future::ready(result)
    }
}

/// A command-line tool that accepts image data on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardTool {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardTool {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Tools able to take an image for the given MIME type, in preference order.
    pub fn candidates(mime: &str) -> Vec<ClipboardTool> {
        if !cfg!(target_os = "linux") {
            return Vec::new();
        }
        let mut tools = Vec::new();
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            tools.push(Self::new("wl-copy", &["--type", mime]));
        }
        if std::env::var_os("DISPLAY").is_some() {
            tools.push(Self::new("xclip", &["-selection", "clipboard", "-t", mime, "-i"]));
        }
        tools
    }
}

/// System clipboard reached through `wl-copy` or `xclip`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    async fn pipe(tool: &ClipboardTool, bytes: &[u8]) -> AppResult<()> {
        let failed = |e: std::io::Error| AppError::Clipboard(format!("{}: {}", tool.program, e));

        // xclip forks a process that serves the selection and keeps inherited
        // output handles open, so nothing here may wait on them.
        let mut child = Command::new(&tool.program)
            .args(&tool.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(failed)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(bytes).await.map_err(failed)?;
            stdin.shutdown().await.map_err(failed)?;
        }

        let status = child.wait().await.map_err(failed)?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Clipboard(format!("{} exited with {}", tool.program, status)))
        }
    }
}

impl Clipboard for SystemClipboard {
    fn write_image(&self, mime: &str, bytes: &[u8]) -> impl Future<Output = AppResult<()>> + Send {
        let mime = mime.to_string();
        let bytes = bytes.to_vec();
        async move {
            let mut last_error = None;
            for tool in ClipboardTool::candidates(&mime) {
                match Self::pipe(&tool, &bytes).await {
                    Ok(()) => {
                        debug!("Copied {} bytes via {}", bytes.len(), tool.program);
                        return Ok(());
                    }
                    Err(e) => last_error = Some(e),
                }
            }
            Err(last_error.unwrap_or_else(|| {
                AppError::Clipboard("no image-capable clipboard available on this platform".into())
            }))
        }
    }
}
