//! Step-count progress bar.
//!
//! The bar is cosmetic: it never fails and nothing reads it back.

use console::{style, Term};

use crate::utils::truncate;

/// Width of the bar in characters, excluding the brackets.
pub const BAR_WIDTH: usize = 50;

const FILLED: char = '#';
const EMPTY: char = '-';

/// Completed percentage, floored. An empty plan counts as done.
pub fn percent(current: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    current.min(total) * 100 / total
}

/// Render `[###---]` for the given position. Each filled cell is two percent.
pub fn render_bar(current: usize, total: usize) -> String {
    let filled = percent(current, total) / 2;
    let empty = BAR_WIDTH - filled;

    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(empty));
    bar.push(']');
    bar
}

/// Tracks how many of `total` steps have started.
#[derive(Debug, Clone)]
pub struct Progress {
    total: usize,
    current: usize,
    term: Option<Term>,
}

impl Progress {
    /// A tracker that draws on stdout.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            term: Some(Term::stdout()),
        }
    }

    /// A tracker that counts but draws nothing.
    pub fn hidden(total: usize) -> Self {
        Self {
            total,
            current: 0,
            term: None,
        }
    }

    /// Move to the next step. Saturates at `total`.
    pub fn advance(&mut self) -> usize {
        if self.current < self.total {
            self.current += 1;
        }
        self.current
    }

    /// Plain-text status line for the current position.
    pub fn line(&self, title: &str) -> String {
        format!(
            "{} {:>3}% ({}/{}) {}",
            render_bar(self.current, self.total),
            percent(self.current, self.total),
            self.current,
            self.total,
            title
        )
    }

    /// Draw the current position. On a terminal the previous line is
    /// overwritten; otherwise each step gets its own line.
    pub fn draw(&self, title: &str) {
        let Some(term) = &self.term else {
            return;
        };

        if !term.is_term() {
            let _ = term.write_line(&self.line(title));
            return;
        }

        // bar, percentage and counter take roughly 70 columns
        let (_, cols) = term.size();
        let title = truncate(title, (cols as usize).saturating_sub(70).max(10));

        let text = format!(
            "{} {} {}",
            style(render_bar(self.current, self.total)).cyan(),
            style(format!("{:>3}%", percent(self.current, self.total))).bold(),
            style(format!("({}/{}) {}", self.current, self.total, title)).dim()
        );

        let _ = term.clear_line();
        let _ = term.write_str(&text);
    }

    /// Leave the bar line so later output starts on a fresh line.
    pub fn finish(&self) {
        if let Some(term) = &self.term {
            if term.is_term() {
                let _ = term.write_line("");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_floors() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 9), 11);
        assert_eq!(percent(0, 9), 0);
    }

    #[test]
    fn test_percent_empty_plan() {
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_bar_segments_always_fill_width() {
        for total in 1..=40 {
            for current in 1..=total {
                let bar = render_bar(current, total);
                let filled = bar.chars().filter(|c| *c == FILLED).count();
                let empty = bar.chars().filter(|c| *c == EMPTY).count();

                assert_eq!(filled, (current * 100 / total) / 2);
                assert_eq!(filled + empty, BAR_WIDTH);
                assert_eq!(bar.chars().count(), BAR_WIDTH + 2);
            }
        }
    }

    #[test]
    fn test_bar_extremes() {
        assert_eq!(render_bar(9, 9), format!("[{}]", "#".repeat(50)));
        assert_eq!(render_bar(0, 9), format!("[{}]", "-".repeat(50)));
    }

    #[test]
    fn test_advance_is_monotonic_and_saturates() {
        let mut progress = Progress::hidden(2);
        assert!(progress.line("x").contains("(0/2)"));
        assert_eq!(progress.advance(), 1);
        assert_eq!(progress.advance(), 2);
        assert_eq!(progress.advance(), 2);
        assert!(progress.line("x").ends_with("100% (2/2) x"));
    }

    #[test]
    fn test_line_format() {
        let mut progress = Progress::hidden(4);
        progress.advance();
        let line = progress.line("Updating package lists");
        assert!(line.starts_with(&format!("[{}{}]", "#".repeat(12), "-".repeat(38))));
        assert!(line.ends_with(" 25% (1/4) Updating package lists"));
    }
}
