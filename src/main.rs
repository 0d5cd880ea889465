#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::fs::File;
use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use rig_planner::simulation::{ScenarioConfig, Simulation};
use rig_planner::ui::{
    field::compute_field_grid,
    render::{draw_ui, overlay},
};

const LOG_FILE: &str = "rig_planner.log";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to a file so the terminal view stays intact
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(File::create(LOG_FILE)?)))
        .init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => ScenarioConfig::from_file(path)?,
        None => ScenarioConfig::default(),
    };
    let mut sim = scenario.build()?;
    info!("Starting simulation, seed {}", scenario.seed);

    // Setup Terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let res = run_app(&mut terminal, &mut sim, tick_rate);

    // Restore Terminal
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

    let summary = sim.summary();
    println!(
        "steps: {} | gained: {:.4} | fused: {:.4} | fusions: {} | cost: {:.1}",
        summary.time_steps,
        summary.information_gained,
        summary.information_fused,
        summary.fusion_events,
        summary.cost_spent
    );

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    sim: &mut Simulation,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        // 1. Update
        if last_tick.elapsed() >= tick_rate {
            sim.step();
            last_tick = Instant::now();
        }

        // 2. Render
        terminal.draw(|f| {
            let area = f.area();
            let rows = (area.height as usize).saturating_sub(1); // -1 for HUD
            let cols = area.width as usize;
            let bounds = *sim.bounds();
            let volunteer = sim.volunteer();

            // Compute background in parallel
            let mut grid = compute_field_grid(volunteer.field(), &bounds, rows, cols);

            for p in volunteer.planned_path().iter().skip(1) {
                overlay(&mut grid, p, &bounds, cols, 'o');
            }
            for follower in sim.followers() {
                let marker = follower.name().chars().next().unwrap_or('F').to_ascii_uppercase();
                overlay(&mut grid, &follower.position(), &bounds, cols, marker);
            }
            overlay(&mut grid, &volunteer.position(), &bounds, cols, 'V');

            let summary = sim.summary();
            let hud = format!(
                "k: {} | I: {:.3} | fused: {:.3} | cost: {:.1}/{:.1} | tree: {} | {}",
                summary.time_steps,
                summary.information_gained,
                summary.information_fused,
                summary.cost_spent,
                volunteer.config().budget,
                volunteer.tree().map_or(0, rig_planner::simulation::planning::Tree::len),
                if sim.is_finished() { "done, q to quit" } else { "q to quit" }
            );

            draw_ui(f, grid, &hud);
        })?;

        // 3. Input
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}
