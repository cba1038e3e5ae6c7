use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use sagra_core::filter::FilterStats;
use sagra_core::geo::{BoundingBox, Coordinates, DEFAULT_CENTER};
use sagra_core::{Category, DateWindow, FilterState};

use super::{load_config, open_store, report};
use crate::render::{Render, render_day_groups};
use crate::utils::tui::create_spinner;

pub struct Filters {
    pub category: Option<Category>,
    pub when: Option<DateWindow>,
    pub radius: Option<f64>,
    pub near: Option<Coordinates>,
}

impl Filters {
    /// A radius with no position to measure from is ignored.
    fn ignored_radius(&self) -> Option<f64> {
        self.radius.filter(|_| self.near.is_none())
    }

    fn to_state(&self) -> FilterState {
        let mut state = FilterState::new();
        state.set_category(self.category);
        state.set_date_window(self.when);
        state.set_radius_km(self.radius);
        state.set_user_position(self.near);
        state
    }
}

pub async fn run(filters: Filters, stats: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    if let Some(radius) = filters.ignored_radius() {
        tracing::warn!(radius_km = radius, "--radius needs --near LAT,LNG, ignoring it");
    }

    let state = filters.to_state();

    let spinner = create_spinner("Loading events");
    let result = store.load_events().await;
    spinner.finish_and_clear();
    let all = result.map_err(report)?;

    let events = store.search(&state).await.map_err(report)?;

    if events.is_empty() {
        if state.has_active_filters() {
            println!("{}", "No events match these filters".dimmed());
        } else {
            println!("{}", "No upcoming events".dimmed());
        }
        return Ok(());
    }

    let today = Local::now().date_naive();
    println!("{}", render_day_groups(&events, &state, today));

    if stats {
        println!();
        println!("{}", FilterStats::compute(&all, &events, today).render());

        match BoundingBox::enclosing(events.iter().filter_map(|e| e.coordinates)) {
            Some(bounds) => println!(
                "  Area:  {} to {} (center {})",
                bounds.south_west,
                bounds.north_east,
                bounds.center()
            ),
            None => println!(
                "  Area:  {}",
                format!("no events on the map (center {})", DEFAULT_CENTER).dimmed()
            ),
        }
    }

    Ok(())
}
