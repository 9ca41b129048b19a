// Terminal output helpers
use colored::Colorize;

pub fn print_header(text: &str) {
    println!("\n{}", text.bold().cyan());
    println!("{}", "=".repeat(text.len()).cyan());
}

pub fn print_success(text: &str) {
    println!("{} {}", "✓".green().bold(), text.green());
}

pub fn print_warning(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}
