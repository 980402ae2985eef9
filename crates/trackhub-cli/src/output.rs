use colored::Colorize;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Status messages go to stderr so stdout stays machine-readable.
pub fn print_info(msg: &str) {
    eprintln!("{msg}");
}
