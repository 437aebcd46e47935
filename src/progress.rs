//! Start-up progress bar
//!
//! Drawn in place on a terminal stream:
//! `Running Diagnostics: 100%|██████████| 100/100`

use std::io::{self, Write};
use std::time::Duration;

use crate::sampler::Clock;

const BAR_WIDTH: usize = 10;

#[derive(Debug, Clone)]
pub struct ProgressBar {
    label: String,
    total: u32,
}

impl ProgressBar {
    pub fn new(label: impl Into<String>, total: u32) -> Self {
        Self {
            label: label.into(),
            total: total.max(1),
        }
    }

    /// Render the bar after `done` of `total` steps
    pub fn render(&self, done: u32) -> String {
        let done = done.min(self.total);
        let percent = u64::from(done) * 100 / u64::from(self.total);
        let filled = (u64::from(done) * BAR_WIDTH as u64 / u64::from(self.total)) as usize;

        format!(
            "{}: {:>3}%|{}{}| {}/{}",
            self.label,
            percent,
            "█".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            done,
            self.total
        )
    }

    /// Tick through every step, waiting `step` between redraws
    pub fn run<W: Write, C: Clock>(&self, out: &mut W, clock: &C, step: Duration) -> io::Result<()> {
        write!(out, "{}", self.render(0))?;
        out.flush()?;

        for done in 1..=self.total {
            clock.sleep(step);
            write!(out, "\r{}", self.render(done))?;
            out.flush()?;
        }

        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::ManualClock;

    #[test]
    fn test_render_bounds() {
        let bar = ProgressBar::new("Running Diagnostics", 100);
        assert_eq!(bar.render(0), "Running Diagnostics:   0%|          | 0/100");
        assert_eq!(bar.render(100), "Running Diagnostics: 100%|██████████| 100/100");
        assert_eq!(bar.render(250), bar.render(100));
    }

    #[test]
    fn test_render_partial() {
        let bar = ProgressBar::new("Running Diagnostics", 100);
        assert_eq!(bar.render(45), "Running Diagnostics:  45%|████      | 45/100");

        let bar = ProgressBar::new("Scan", 3);
        assert_eq!(bar.render(1), "Scan:  33%|███       | 1/3");
    }

    #[test]
    fn test_zero_total_is_one_step() {
        let bar = ProgressBar::new("Scan", 0);
        assert_eq!(bar.render(1), "Scan: 100%|██████████| 1/1");
    }

    #[test]
    fn test_run_draws_every_step() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut out = Vec::new();

        ProgressBar::new("Running Diagnostics", 4)
            .run(&mut out, &clock, Duration::from_millis(10))
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\r').count(), 4);
        assert!(text.ends_with("Running Diagnostics: 100%|██████████| 4/4\n"));
        assert_eq!(clock.now() - start, Duration::from_millis(40));
    }
}
