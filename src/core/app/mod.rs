use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::core::controller::GenerationController;
use crate::core::models::{GenerationState, StatusSummary, StrokeColor};
use crate::export::{copy_to_clipboard, download, SystemClipboard};
use crate::utils::file::looks_like_image;
use crate::utils::qrcode::terminal_preview;

/// One line of user input in the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Color(StrokeColor),
    Logo(PathBuf),
    RemoveLogo,
    Save,
    Copy,
    Status,
    Preview,
    Help,
    Quit,
    Invalid(String),
}

impl Input {
    pub fn parse(line: &str) -> Input {
        if let Some(literal) = line.trim_start().strip_prefix("::") {
            return Input::Text(format!(":{}", literal));
        }
        let Some(command) = line.trim_start().strip_prefix(':') else {
            return Input::Text(line.to_string());
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command.trim(), ""),
        };
        match (name, arg) {
            ("color", "") => Input::Invalid("usage: :color <black|blue|red>".into()),
            ("color", color) => match color.parse() {
                Ok(color) => Input::Color(color),
                Err(e) => Input::Invalid(e),
            },
            ("logo", "") => Input::RemoveLogo,
            ("logo", path) => Input::Logo(PathBuf::from(path)),
            ("clear", _) => Input::Text(String::new()),
            ("save", _) => Input::Save,
            ("copy", _) => Input::Copy,
            ("status", _) => Input::Status,
            ("preview", _) => Input::Preview,
            ("help", _) => Input::Help,
            ("quit" | "q", _) => Input::Quit,
            (other, _) => Input::Invalid(format!("unknown command ':{}' (try :help)", other)),
        }
    }
}

const HELP: &str = "\
Type any text to encode it. Commands:
  :color <black|blue|red>   change the module color
  :logo <path>              overlay a logo
  :logo                     remove the logo
  :clear                    clear the text
  :save                     write qr-code-<timestamp>.png
  :copy                     copy the PNG to the clipboard
  :status                   show the current state
  :preview                  print the code in the terminal
  :quit                     exit
  ::text                    encode text that starts with ':'";

/// Settings for a single non-interactive generation.
#[derive(Debug, Clone)]
pub struct OneShot {
    pub text: String,
    pub color: StrokeColor,
    pub logo: Option<PathBuf>,
    pub copy: bool,
}

pub struct App {
    config: AppConfig,
    controller: GenerationController,
    clipboard: SystemClipboard,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let controller = GenerationController::from_config(&config.render);
        Self {
            config,
            controller,
            clipboard: SystemClipboard,
        }
    }

    pub fn controller(&self) -> &GenerationController {
        &self.controller
    }

    pub async fn run_once(&self, job: OneShot) -> Result<PathBuf> {
        if job.text.trim().is_empty() {
            bail!("nothing to encode: text is empty");
        }
        self.controller.set_color(job.color)?;
        if let Some(ref logo) = job.logo {
            self.load_logo(logo).await?;
        }
        self.controller.set_text(job.text)?;

        let status = self.controller.settled().await?;
        if status.state != GenerationState::Ready {
            bail!(
                "generation failed: {}",
                status.last_error.unwrap_or_else(|| "unknown error".into())
            );
        }
        if let Some(err) = &status.last_error {
            warn!("{}", err);
        }

        let path = self
            .save()
            .await?
            .context("no image was produced")?;
        if job.copy {
            copy_to_clipboard(status.image.as_deref(), &self.clipboard).await?;
        }
        Ok(path)
    }

    pub async fn run_interactive(&self) -> Result<()> {
        info!(
            "Rendering {}px codes, debounce {}ms. Type :help for commands.",
            self.config.render.size, self.config.render.debounce_ms
        );
        let watcher = self.spawn_status_logger();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if !self.handle(Input::parse(&line)).await {
                break;
            }
        }

        watcher.abort();
        info!("Session ended");
        Ok(())
    }

    /// Applies one input. Returns `false` when the session should end.
    pub async fn handle(&self, input: Input) -> bool {
        let result: Result<()> = match input {
            Input::Text(text) => self.controller.set_text(text).map_err(Into::into),
            Input::Color(color) => self.controller.set_color(color).map_err(Into::into),
            Input::Logo(path) => self.load_logo(&path).await,
            Input::RemoveLogo => self.controller.clear_logo().map_err(Into::into),
            Input::Save => self.save().await.map(|saved| {
                if saved.is_none() {
                    println!("Nothing to save yet");
                }
            }),
            Input::Copy => copy_to_clipboard(self.controller.current_image().as_deref(), &self.clipboard)
                .await
                .map(|copied| println!("{}", if copied { "Copied" } else { "Nothing to copy yet" }))
                .map_err(Into::into),
            Input::Status => self.print_status(),
            Input::Preview => {
                self.print_preview();
                Ok(())
            }
            Input::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Input::Quit => return false,
            Input::Invalid(message) => {
                println!("{}", message);
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("{:#}", e);
        }
        true
    }

    async fn load_logo(&self, path: &Path) -> Result<()> {
        if !looks_like_image(path) {
            warn!("{} does not look like an image; trying anyway", path.display());
        }
        self.controller
            .load_logo(path)
            .await
            .with_context(|| format!("failed to read logo {}", path.display()))
    }

    async fn save(&self) -> Result<Option<PathBuf>> {
        let image = self.controller.current_image();
        let saved = download(image.as_deref(), &self.config.export_directory()).await?;
        if let Some(ref path) = saved {
            println!("Saved {}", path.display());
            if self.config.export.open_after_save {
                if let Err(e) = open::that(path) {
                    error!("Failed to open {}: {}", path.display(), e);
                }
            }
        }
        Ok(saved)
    }

    fn print_status(&self) -> Result<()> {
        let status = self.controller.status();
        let summary = StatusSummary::from(&status);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }

    fn print_preview(&self) {
        match self.controller.current_image() {
            Some(image) => match terminal_preview(&image.request.text, image.error_correction) {
                Ok(preview) => println!("{}", preview),
                Err(e) => error!("Failed to render preview: {}", e),
            },
            None => println!("Nothing to preview yet"),
        }
    }

    fn spawn_status_logger(&self) -> JoinHandle<()> {
        let mut status = self.controller.subscribe();
        let preview = self.config.ui.preview;
        tokio::spawn(async move {
            let mut last_state = GenerationState::Idle;
            while status.changed().await.is_ok() {
                let current = status.borrow_and_update().clone();
                if current.state == last_state {
                    continue;
                }
                last_state = current.state;
                match (current.state, current.image.as_deref()) {
                    (GenerationState::Ready, Some(image)) => {
                        info!(
                            "Ready: {}px {} code, error correction {:?}",
                            image.dimension, image.request.color, image.error_correction
                        );
                        if let Some(err) = &current.last_error {
                            warn!("{}", err);
                        }
                        if preview {
                            if let Ok(text) = terminal_preview(&image.request.text, image.error_correction) {
                                println!("{}", text);
                            }
                        }
                    }
                    (GenerationState::Failed, _) => {
                        warn!(
                            "Generation failed, keeping previous image: {}",
                            current.last_error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    (GenerationState::Idle, _) => info!("Cleared"),
                    _ => {}
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_text() {
        assert_eq!(Input::parse("https://example.com"), Input::Text("https://example.com".into()));
        assert_eq!(Input::parse(""), Input::Text(String::new()));
        assert_eq!(Input::parse("  spaced  "), Input::Text("  spaced  ".into()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(Input::parse(":color red"), Input::Color(StrokeColor::Red));
        assert_eq!(Input::parse(":logo ./brand.png"), Input::Logo(PathBuf::from("./brand.png")));
        assert_eq!(Input::parse(":logo"), Input::RemoveLogo);
        assert_eq!(Input::parse(":clear"), Input::Text(String::new()));
        assert_eq!(Input::parse(":save"), Input::Save);
        assert_eq!(Input::parse(":copy"), Input::Copy);
        assert_eq!(Input::parse(":q"), Input::Quit);
    }

    #[test]
    fn test_double_colon_escapes_text() {
        assert_eq!(Input::parse("::)"), Input::Text(":)".into()));
        assert_eq!(Input::parse("::8080/path"), Input::Text(":8080/path".into()));
        assert_eq!(Input::parse("::color red"), Input::Text(":color red".into()));
        assert!(matches!(Input::parse(":)"), Input::Invalid(_)));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(Input::parse(":color green"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":color"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":bogus"), Input::Invalid(_)));
    }

    #[tokio::test]
    async fn test_handle_quit_ends_session() {
        let app = App::new(AppConfig::default());
        assert!(app.handle(Input::Help).await);
        assert!(!app.handle(Input::Quit).await);
    }
}
