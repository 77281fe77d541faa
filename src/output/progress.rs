use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::style::{bright, bright_green, bright_yellow};

/// Progress tracking for the three collection phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1() -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(bright_yellow("Phase 1/3: Listing successful runs").to_string());
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, run_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Found {run_count} successful runs ✓")).to_string(),
        );
        let pb = create_bar(
            run_count as u64,
            bright_yellow("Phase 2/3: Fetching jobs").to_string(),
        );
        Self { pb }
    }

    /// Count one run whose jobs have been fetched.
    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 2/3: Fetched jobs for all runs ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 3/3: Computing durations").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self, row_count: usize) {
        self.pb.finish_with_message(
            bright_green(format!("Phase 3/3: Collected {row_count} job durations ✓")).to_string(),
        );
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn create_bar(len: u64, message: String) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message(message);
    pb
}
