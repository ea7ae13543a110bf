use anyhow::{Context, Result};
use clap::Parser;
use pacmaze_core::{
    agent::QLearningAgent,
    config::{AgentConfig, RewardConfig, TrainingConfig},
    environment::{Environment, State},
    maze::Maze,
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze file to load
    #[arg(short, long, value_name = "MAZE_FILE")]
    maze: Option<PathBuf>,

    /// Q-table file to load from and save to
    #[arg(short, long, default_value = "pacmaze_q_table.bin")]
    table: PathBuf,

    /// Number of episodes to play
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Evaluate greedily (epsilon = 0, no learning, no saving)
    #[arg(short, long)]
    greedy: bool,

    /// Seed for the environment and agent RNGs
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Milliseconds between simulation steps
    #[arg(long, default_value_t = 25)]
    tick_ms: u64,

    /// Simulation steps to run per tick (raise for faster training)
    #[arg(long, default_value_t = 1)]
    steps_per_tick: usize,
}

/// Episodes between checkpoint saves of the Q-table.
const CHECKPOINT_INTERVAL: usize = 100;

struct App {
    environment: Environment,
    agent: QLearningAgent,
    training: TrainingConfig,
    /// Greedy evaluation mode: no exploration, no learning.
    greedy: bool,
    table_path: PathBuf,
    state: State,
    episode: usize,
    episode_steps: usize,
    last_score: Option<f64>,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Set once every episode has been played.
    finished: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let maze_file = args
            .maze
            .clone()
            .unwrap_or_else(|| PathBuf::from("maps/maze01.txt"));
        let maze = Maze::load(&maze_file)
            .with_context(|| format!("Failed to load maze {}", maze_file.display()))?;

        let mut environment = Environment::new(maze, RewardConfig::default(), args.seed);
        let mut agent = QLearningAgent::new(&AgentConfig::default(), args.seed.wrapping_add(1));

        let loaded = agent
            .load(&args.table)
            .with_context(|| format!("Failed to load Q-table {}", args.table.display()))?;
        if !loaded {
            eprintln!(
                "Q-table {} not found. Starting with an empty table.",
                args.table.display()
            );
        }
        if args.greedy {
            agent.set_epsilon(0.0);
        }

        let mut training = TrainingConfig::default();
        if let Some(episodes) = args.episodes {
            training.episodes = episodes;
        }
        if args.greedy {
            // Evaluation runs default to a handful of show games.
            training.episodes = args.episodes.unwrap_or(5);
        }

        let state = environment.reset();
        Ok(App {
            environment,
            agent,
            training,
            greedy: args.greedy,
            table_path: args.table.clone(),
            state,
            episode: 1,
            episode_steps: 0,
            last_score: None,
            should_quit: false,
            finished: false,
        })
    }

    /// Runs one agent/environment/learn exchange.
    fn tick(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        let action = self.agent.choose_action(self.state);
        let transition = self.environment.step(action);
        if !self.greedy {
            self.agent
                .learn(self.state, action, transition.reward, transition.state);
        }
        self.state = transition.state;
        self.episode_steps += 1;

        let truncated = self.episode_steps >= self.training.max_steps;
        if transition.done || truncated {
            self.finish_episode()?;
        }
        Ok(())
    }

    fn finish_episode(&mut self) -> Result<()> {
        self.last_score = Some(self.environment.score());
        if !self.greedy {
            self.agent.update_epsilon();
            if self.episode % CHECKPOINT_INTERVAL == 0 {
                self.save_table()?;
            }
        }

        if self.episode >= self.training.episodes {
            self.finished = true;
            if !self.greedy {
                self.save_table()?;
            }
        } else {
            self.episode += 1;
            self.episode_steps = 0;
            self.state = self.environment.reset();
        }
        Ok(())
    }

    fn save_table(&self) -> Result<()> {
        self.agent
            .save(&self.table_path)
            .with_context(|| format!("Failed to save Q-table {}", self.table_path.display()))
    }

    /// Sets the quit flag, persisting learned values first.
    fn quit(&mut self) -> Result<()> {
        if !self.greedy {
            self.save_table()?;
        }
        self.should_quit = true;
        Ok(())
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Create the application state before touching the terminal so maze
    // and Q-table errors print normally.
    let mut app = App::new(&args)?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, &args);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    args: &Args,
) -> Result<()> {
    let tick_rate = Duration::from_millis(args.tick_ms);
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        // Poll for events (keyboard, mouse, etc.)
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit()?,
                    _ => {}
                }
            }
        }

        // Update application state if enough time has passed
        if last_tick.elapsed() >= tick_rate {
            for _ in 0..args.steps_per_tick.max(1) {
                app.tick()?;
            }
            last_tick = Instant::now();
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Area for the maze
            Constraint::Length(4), // Area for training stats
            Constraint::Length(2), // Area for status/help
        ])
        .split(frame.area());

    render_maze(frame, main_layout[0], &app.environment);
    render_stats(frame, main_layout[1], app);

    let help = if app.finished {
        "Done. Press 'q' or 'Esc' to quit."
    } else {
        "Press 'q' or 'Esc' to quit (the Q-table is saved on exit)."
    };
    let help_text = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders episode and agent statistics onto the frame.
fn render_stats(frame: &mut Frame, area: Rect, app: &App) {
    let mode = if app.greedy { "evaluate" } else { "train" };
    let last_score = app
        .last_score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.0}"));
    let lines = vec![
        Line::from(format!(
            "Episode: {}/{}  Steps: {}  Mode: {}",
            app.episode, app.training.episodes, app.episode_steps, mode
        )),
        Line::from(format!(
            "Score: {:.0}  Last episode: {}  Epsilon: {:.4}  Q-table entries: {}",
            app.environment.score(),
            last_score,
            app.agent.epsilon(),
            app.agent.table().len()
        )),
    ];
    let stats =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Training"));
    frame.render_widget(stats, area);
}

/// Renders the maze, pellets and both entities onto the frame.
fn render_maze(frame: &mut Frame, area: Rect, environment: &Environment) {
    let maze = environment.maze();
    let agent_pos = environment.agent_position();
    let adversary_pos = environment.adversary_position();

    let mut lines: Vec<Line> = Vec::with_capacity(maze.height());
    for y in 0..maze.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(maze.width());
        for x in 0..maze.width() {
            let pos = pacmaze_core::Position::new(x, y);
            let span = if pos == agent_pos {
                Span::styled("@", Style::default().fg(Color::Yellow).bold())
            } else if pos == adversary_pos {
                Span::styled("G", Style::default().fg(Color::Red).bold())
            } else if environment.pellets().contains(&pos) {
                Span::styled(".", Style::default().fg(Color::White))
            } else {
                match maze.cell(x, y) {
                    Some(pacmaze_core::maze::Cell::Wall) => {
                        Span::styled("#", Style::default().fg(Color::DarkGray))
                    }
                    _ => Span::raw(" "),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Pacmaze").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(maze_paragraph, area);
}
