use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::core::app::{App, OneShot};
use crate::core::config::AppConfig;
use crate::core::models::StrokeColor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Text or URL to encode; generates once, saves the PNG and exits
    #[arg(short, long)]
    text: Option<String>,

    /// Module color
    #[arg(short, long, value_enum, default_value_t = StrokeColor::Black)]
    color: StrokeColor,

    /// Logo image to place in the center of the code
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Directory exported PNG files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also copy the generated PNG to the clipboard (with --text)
    #[arg(long)]
    copy: bool,

    /// Output size in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Open saved files with the default viewer
    #[arg(long)]
    open: bool,

    /// Disable the terminal preview
    #[arg(long)]
    no_preview: bool,

    /// Generate example configuration file
    #[arg(long)]
    generate_config: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        // Generate config file if requested
        if self.generate_config {
            AppConfig::save_example()?;
            println!("Generated example configuration file: qrstudio.example.toml");
            return Ok(());
        }

        let config = self.resolve_config();
        config.validate()?;
        let app = App::new(config);

        match self.text {
            Some(ref text) => {
                let path = app
                    .run_once(OneShot {
                        text: text.clone(),
                        color: self.color,
                        logo: self.logo.clone(),
                        copy: self.copy,
                    })
                    .await?;
                println!("{}", path.display());
                Ok(())
            }
            None => {
                app.controller().set_color(self.color)?;
                if let Some(ref logo) = self.logo {
                    app.controller().load_logo(logo).await?;
                }
                app.run_interactive().await
            }
        }
    }

    fn resolve_config(&self) -> AppConfig {
        let mut config = AppConfig::load().unwrap_or_else(|e| {
            info!("Using default configuration ({})", e);
            AppConfig::default()
        });

        // Override config with CLI arguments
        if let Some(ref dir) = self.output_dir {
            config.export.directory = Some(dir.clone());
        }
        if let Some(size) = self.size {
            config.render.size = size;
        }
        if self.open {
            config.export.open_after_save = true;
        }
        if self.no_preview {
            config.ui.preview = false;
        }
        config
    }
}
