//! REPL session management

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::domain::{ImagePayload, load_image};
use crate::gateway::AnalysisGateway;
use crate::render::{render_plan, render_stats};

/// Interactive analysis session
///
/// Attached images are kept between prompts until cleared, so a user can
/// attach a photo once and refine the text around it.
pub struct ReplSession {
    gateway: Arc<AnalysisGateway>,
    images: Vec<ImagePayload>,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(gateway: Arc<AnalysisGateway>) -> Self {
        Self {
            gateway,
            images: Vec::new(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.analyze(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Unscatter".bright_cyan().bold());
        println!("Type anything on your mind; it comes back as a plan.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn analyze(&self, input: &str) {
        debug!(image_count = self.images.len(), "ReplSession::analyze: called");
        match self.gateway.analyze(input, &self.images).await {
            Ok(result) => print!("{}", render_plan(&result)),
            Err(e) => println!("{} {}", "!".red(), e),
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/image" | "/i" => {
                self.attach_image(rest);
                SlashResult::Continue
            }
            "/images" => {
                self.print_images();
                SlashResult::Continue
            }
            "/clear" | "/c" => {
                self.images.clear();
                self.gateway.clear_cache().await;
                println!("{}", "Images and cached results cleared.".dimmed());
                SlashResult::Continue
            }
            "/stats" => {
                let cache = self.gateway.cache_stats().await;
                let limiter = self.gateway.limiter_stats().await;
                println!("{}", render_stats(&cache, &limiter));
                SlashResult::Continue
            }
            "/reset" => {
                self.gateway.reset_limiter().await;
                println!("{}", "Request limit reset.".dimmed());
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn attach_image(&mut self, path: &str) {
        if path.is_empty() {
            println!("{} Usage: /image <path>", "?".yellow());
            return;
        }

        match load_image(Path::new(path)) {
            Ok(image) => {
                self.images.push(image);
                println!("{} Attached {} ({} total)", "+".green(), path, self.images.len());
            }
            Err(e) => println!("{} {}", "!".red(), e),
        }
    }

    fn print_images(&self) {
        if self.images.is_empty() {
            println!("{}", "No images attached.".dimmed());
            return;
        }

        for (i, image) in self.images.iter().enumerate() {
            println!("  {}. {} ({} base64 chars)", i + 1, image.mime_type, image.data.len());
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:16} Show this help", "/help".yellow());
        println!("  {:16} Attach an image to the next analyses", "/image <path>".yellow());
        println!("  {:16} List attached images", "/images".yellow());
        println!("  {:16} Drop attached images and cached results", "/clear".yellow());
        println!("  {:16} Show cache and request usage", "/stats".yellow());
        println!("  {:16} Reset the request limit", "/reset".yellow());
        println!("  {:16} Exit the REPL", "/quit".yellow());
        println!();
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
