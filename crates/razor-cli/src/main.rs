mod report;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use razor_config::{Config, discover_templates};
use razor_syntax::ParserOptions;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

struct App {
    root: PathBuf,
    files: Vec<PathBuf>,
    options: ParserOptions,
    file_list_state: ListState,
    current_content: Vec<String>,
    scroll: u16,
}

impl App {
    fn new(root: PathBuf, files: Vec<PathBuf>, options: ParserOptions) -> Self {
        let mut app = Self {
            root,
            files,
            options,
            file_list_state: ListState::default(),
            current_content: Vec::new(),
            scroll: 0,
        };

        if !app.files.is_empty() {
            app.file_list_state.select(Some(0));
            app.update_content_for_selection();
        }

        app
    }

    fn next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.files.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn previous_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.files.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn update_content_for_selection(&mut self) {
        self.scroll = 0;
        let Some(path) = self
            .file_list_state
            .selected()
            .and_then(|index| self.files.get(index))
        else {
            return;
        };
        self.current_content = match report::parse_file(path, &self.options) {
            Ok(results) => report::report_lines(&results),
            Err(e) => vec![format!("Error: {e:#}")],
        };
    }

    fn display_name(&self, path: &std::path::Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

struct Args {
    dump: bool,
    path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut dump = false;
    let mut path = None;
    for arg in args {
        match arg.as_str() {
            "--dump" => dump = true,
            _ if arg.starts_with('-') => return None,
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }
    Some(Args { dump, path })
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("razor-cli");
    let Some(cli) = parse_args(&args[1.min(args.len())..]) else {
        eprintln!("Usage: {program} [--dump] [templates-path]");
        process::exit(1);
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (root, patterns, options) = match (cli.path, &config) {
        (Some(path), config) => {
            let patterns = config
                .as_ref()
                .map(|c| c.patterns.clone())
                .unwrap_or_default();
            let options = config
                .as_ref()
                .map(Config::parser_options)
                .unwrap_or_default();
            (path, patterns, options)
        }
        (None, Some(config)) => {
            log::info!("Using templates path from {}", config_path.display());
            (
                config.templates_path.clone(),
                config.patterns.clone(),
                config.parser_options(),
            )
        }
        (None, None) => {
            eprintln!("Error: No templates path provided and no config file found");
            eprintln!("Usage: {program} [--dump] [templates-path]");
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
    };

    let files = if root.is_file() {
        vec![root.clone()]
    } else {
        match discover_templates(&root, &patterns) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    };
    log::info!("Found {} template(s) under {}", files.len(), root.display());

    if cli.dump {
        return dump(&files, &options);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(root, files, options);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn dump(files: &[PathBuf], options: &ParserOptions) -> Result<()> {
    let mut failed = 0;
    for path in files {
        println!("== {} ==", path.display());
        let results = report::parse_file(path, options)?;
        if !results.success() {
            failed += 1;
        }
        for line in report::report_lines(&results) {
            println!("{line}");
        }
        println!();
    }
    if failed > 0 {
        log::warn!("{failed} of {} template(s) have diagnostics", files.len());
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::PageDown | KeyCode::Char(' ') => app.scroll = app.scroll.saturating_add(10),
                KeyCode::PageUp => app.scroll = app.scroll.saturating_sub(10),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(f.area());

    // Template list panel
    let file_items: Vec<ListItem> = app
        .files
        .iter()
        .map(|path| ListItem::new(vec![Line::from(vec![Span::raw(app.display_name(path))])]))
        .collect();

    let files_list = List::new(file_items)
        .block(Block::default().borders(Borders::ALL).title("Templates"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    // Tree and diagnostics panel
    let content_text = if app.current_content.is_empty() {
        vec![Line::from("Select a template to view its tree")]
    } else {
        app.current_content
            .iter()
            .map(|line| {
                let style = if line.starts_with("  (") || line.ends_with("diagnostic(s):") {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                Line::from(vec![Span::styled(line.clone(), style)])
            })
            .collect()
    };

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title("Tree"))
        .scroll((app.scroll, 0));

    f.render_widget(content, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k: Previous | "),
        Span::raw("↓/j: Next | "),
        Span::raw("PgDn/Space, PgUp: Scroll"),
    ]);

    let help = Paragraph::new(vec![help_text]).block(Block::default());

    // Place help at bottom
    let bottom_chunk = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    f.render_widget(help, bottom_chunk[1]);
}
