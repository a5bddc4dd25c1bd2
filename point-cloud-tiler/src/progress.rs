use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar in the shared `[bar] pos/len unit (percent) msg` layout.
pub fn progress_bar(len: usize, unit: &str, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!(
        "[{{bar:40.green/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
        unit
    );
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(message);
    pb
}
