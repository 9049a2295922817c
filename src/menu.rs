//! Menu navigator
//!
//! One dispatch loop over an explicit screen enum: main menu, category
//! view, per-category config menu. Every view reads the single snapshot
//! captured at startup; nothing in here re-fetches telemetry.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::clipboard::ClipboardSink;
use crate::hardware::SystemSnapshot;
use crate::render;

/// How long the copy confirmation stays up before the category re-renders.
const COPY_CONFIRM_DELAY: Duration = Duration::from_millis(1500);

/// Top-level menu branch, each with its own record type and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cpu,
    Ram,
    GpuControllers,
    Displays,
    Battery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Category(Category),
    Config(Category),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigAction {
    Copy,
    Back,
}

/// Main-menu entry for a selected index; the last entry exits.
fn main_selection(index: usize) -> Screen {
    match index {
        0 => Screen::Category(Category::Cpu),
        1 => Screen::Category(Category::Ram),
        2 => Screen::Category(Category::GpuControllers),
        3 => Screen::Category(Category::Displays),
        4 => Screen::Category(Category::Battery),
        _ => Screen::Done,
    }
}

/// Where a rendered category goes next. Empty controller and display lists
/// short-circuit back to the main menu instead of offering a config menu.
fn next_after_category(category: Category, snapshot: &SystemSnapshot) -> Screen {
    let empty = match category {
        Category::GpuControllers => snapshot.graphics.controllers.is_empty(),
        Category::Displays => snapshot.graphics.displays.is_empty(),
        _ => false,
    };
    if empty {
        Screen::Main
    } else {
        Screen::Config(category)
    }
}

/// Copy re-renders the same category; back always returns to the main menu.
fn next_after_config(action: ConfigAction, category: Category) -> Screen {
    match action {
        ConfigAction::Copy => Screen::Category(category),
        ConfigAction::Back => Screen::Main,
    }
}

pub struct Navigator<C: ClipboardSink> {
    snapshot: SystemSnapshot,
    clipboard: C,
}

impl<C: ClipboardSink> Navigator<C> {
    /// The navigator owns the snapshot for the rest of the process; there
    /// is deliberately no way to refresh it.
    pub fn new(snapshot: SystemSnapshot, clipboard: C) -> Self {
        Navigator {
            snapshot,
            clipboard,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut screen = Screen::Main;
        loop {
            screen = match screen {
                Screen::Main => self.main_menu()?,
                Screen::Category(category) => self.show_category(category)?,
                Screen::Config(category) => self.config_menu(category)?,
                Screen::Done => {
                    clear_screen();
                    println!("\n{}\n", "See you next time!".green().bold());
                    return Ok(());
                }
            };
        }
    }

    fn main_menu(&self) -> Result<Screen> {
        clear_screen();
        println!("{}", "SYSTEM INFORMATION".bold().white());
        println!("{}", "Select a category to inspect".bold().blue());
        let choice = prompt_choice(
            "What do you want to check?",
            &[
                "CPU".magenta().to_string(),
                "RAM".blue().to_string(),
                "GPU Controllers".yellow().to_string(),
                "Displays".cyan().to_string(),
                "Battery".green().to_string(),
                "Exit".red().to_string(),
            ],
        )?;
        Ok(main_selection(choice))
    }

    fn show_category(&self, category: Category) -> Result<Screen> {
        clear_screen();
        println!("{}", self.render_category(category));

        let next = next_after_category(category, &self.snapshot);
        if next == Screen::Main {
            wait_for_enter()?;
        }
        Ok(next)
    }

    fn config_menu(&mut self, category: Category) -> Result<Screen> {
        let choice = prompt_choice(
            "What do you want to do?",
            &[
                "Copy info to clipboard (JSON)".green().to_string(),
                "Back to menu".red().to_string(),
            ],
        )?;
        let action = match choice {
            0 => ConfigAction::Copy,
            _ => ConfigAction::Back,
        };

        if action == ConfigAction::Copy {
            self.copy_category(category);
            thread::sleep(COPY_CONFIRM_DELAY);
        }
        Ok(next_after_config(action, category))
    }

    /// Serialize the category record and hand it to the clipboard sink.
    /// A failed write is reported and logged, never fatal.
    fn copy_category(&mut self, category: Category) {
        clear_screen();
        match self.try_copy(category) {
            Ok(()) => {
                println!("\n{}\n", "Info copied to clipboard".bold().green());
            }
            Err(err) => {
                tracing::warn!(error = %err, "clipboard write failed");
                println!(
                    "\n{} {}\n",
                    "Could not copy to clipboard:".bold().red(),
                    err.to_string().red()
                );
            }
        }
    }

    fn try_copy(&mut self, category: Category) -> Result<()> {
        let payload = self.payload_for(category)?;
        self.clipboard.write_text(&payload)?;
        Ok(())
    }

    /// The category's full structured record as 2-space-indented JSON.
    fn payload_for(&self, category: Category) -> Result<String> {
        let payload = match category {
            Category::Cpu => serde_json::to_string_pretty(&self.snapshot.cpu)?,
            Category::Ram => serde_json::to_string_pretty(&self.snapshot.memory)?,
            Category::GpuControllers => {
                serde_json::to_string_pretty(&self.snapshot.graphics.controllers)?
            }
            Category::Displays => serde_json::to_string_pretty(&self.snapshot.graphics.displays)?,
            Category::Battery => serde_json::to_string_pretty(&self.snapshot.battery)?,
        };
        Ok(payload)
    }

    fn render_category(&self, category: Category) -> String {
        match category {
            Category::Cpu => render::cpu_screen(&self.snapshot.cpu),
            Category::Ram => render::memory_screen(&self.snapshot.memory),
            Category::GpuControllers => {
                render::controllers_screen(&self.snapshot.graphics.controllers)
            }
            Category::Displays => render::displays_screen(&self.snapshot.graphics.displays),
            Category::Battery => render::battery_screen(&self.snapshot.battery),
        }
    }
}

fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = io::stdout().flush();
}

/// Numbered single-choice prompt over stdin. Re-asks until the input is a
/// valid 1-based index.
fn prompt_choice(prompt: &str, options: &[String]) -> Result<usize> {
    loop {
        println!();
        println!("{}", prompt.cyan());
        for (i, opt) in options.iter().enumerate() {
            println!("  {} {}", format!("{:>2}.", i + 1).bright_black(), opt);
        }
        print!("{} ", "Enter a number:".bright_yellow());
        let _ = io::stdout().flush();

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let trimmed = input.trim();
        if let Ok(n) = trimmed.parse::<usize>() {
            if n >= 1 && n <= options.len() {
                return Ok(n - 1);
            }
        }
        println!("{}", "Invalid choice. Try again.".bright_red());
    }
}

fn wait_for_enter() -> Result<()> {
    print!("{} ", "Press Enter to return to the menu.".bright_yellow());
    let _ = io::stdout().flush();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(())
}
