// envscope: environment-model diagrams in the terminal

use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use envscope::config::DEFAULT_CONFIG;
use envscope::demo;
use envscope::ui::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("envscope");
    let trace = args.get(1).map(|s| s.as_str()).unwrap_or(demo::TRACES[0]);

    // Snapshot memory limit (64 MB)
    let snapshot_limit = 64 * 1024 * 1024;
    let history = match demo::history(trace, snapshot_limit)? {
        Some(history) => history,
        None => {
            eprintln!("Error: Unknown trace '{}'", trace);
            eprintln!();
            eprintln!("Usage: {} [trace]", program_name);
            eprintln!();
            eprintln!("Traces:");
            for name in demo::TRACES {
                eprintln!("  {} {}", program_name, name);
            }
            std::process::exit(1);
        }
    };
    eprintln!("Loaded '{}': {} steps", trace, history.len());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(history, DEFAULT_CONFIG, trace.to_string());
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
