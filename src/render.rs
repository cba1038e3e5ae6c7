//! Colored terminal rendering for sagra types.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use sagra_core::filter::{FilterStats, day_offset_label};
use sagra_core::user::UserRecord;
use sagra_core::{Category, EventRecord, FilterState};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Category {
    fn render(&self) -> String {
        let tag = format!("[{}]", self.label());
        match self {
            Category::FestaPaese | Category::FestaBirra => tag.yellow().to_string(),
            Category::StreetFood => tag.red().to_string(),
            Category::Concerto => tag.magenta().to_string(),
            Category::Bambini => tag.cyan().to_string(),
            Category::Cultura => tag.blue().to_string(),
            Category::Sport => tag.green().to_string(),
            Category::Other => tag.dimmed().to_string(),
        }
    }
}

impl Render for UserRecord {
    fn render(&self) -> String {
        let name = if self.name.is_empty() { "(no name)" } else { self.name.as_str() };
        let since = self
            .first_login
            .map(|t| format!("since {}", t.format("%Y-%m-%d")))
            .unwrap_or_default();

        if self.active {
            format!("  {} {} {}", name, self.email.dimmed(), since.dimmed())
        } else {
            format!("  {} {} {}", name.dimmed(), self.email.dimmed(), "inactive".red())
        }
    }
}

impl Render for FilterStats {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} {} of {} events",
            "Showing".bold(),
            self.filtered,
            self.total
        )];

        for (category, count) in &self.by_category {
            lines.push(format!("  {:>3} {}", count, category.render()));
        }

        if !self.by_day_offset.is_empty() {
            let days: Vec<String> = self
                .by_day_offset
                .iter()
                .map(|(offset, count)| format!("{}: {}", day_offset_label(*offset), count))
                .collect();
            lines.push(format!("  {}", days.join(", ").dimmed()));
        }

        lines.join("\n")
    }
}

/// "Today", "Tomorrow" or e.g. "Sat Jun 7".
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{:.1} km", km)
    }
}

/// One line per event, under a bold header for each day.
pub fn render_day_groups(events: &[EventRecord], state: &FilterState, today: NaiveDate) -> String {
    let mut lines = Vec::new();
    let mut current_date: Option<NaiveDate> = None;

    for event in events {
        if current_date != Some(event.date) {
            if current_date.is_some() {
                lines.push(String::new());
            }
            lines.push(date_label(event.date, today).bold().to_string());
            current_date = Some(event.date);
        }

        let time = event.time.as_deref().unwrap_or("");
        let mut line = format!(
            "  {:>5} {} {}",
            time,
            event.title,
            event.category.render()
        );

        line.push_str(&format!(" {}", event.location.dimmed()));
        if let Some(km) = state.distance_to(event) {
            line.push_str(&format!(" {}", format_distance(km).cyan()));
        }
        if let Some(price) = &event.price {
            line.push_str(&format!(" {}", price.green()));
        }

        lines.push(line);
    }

    lines.join("\n")
}
