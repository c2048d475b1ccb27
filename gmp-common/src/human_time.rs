//! Human-readable time and progress formatting
//!
//! Used by queue listings, status lines and UI surfaces.

const FILLED: char = '▰';
const EMPTY: char = '▱';

/// Format a track time as `M:SS`, or `H:MM:SS` from one hour upwards.
///
/// Unknown durations render as `?:??`.
///
/// # Examples
///
/// ```
/// use gmp_common::human_time::fmt_time;
///
/// assert_eq!(fmt_time(Some(5)), "0:05");
/// assert_eq!(fmt_time(Some(215)), "3:35");
/// assert_eq!(fmt_time(Some(3_725)), "1:02:05");
/// assert_eq!(fmt_time(None), "?:??");
/// ```
pub fn fmt_time(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return "?:??".to_string();
    };

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Render a fixed-width progress bar for `elapsed` out of `total` seconds.
///
/// A zero total renders an empty bar; elapsed beyond total renders full.
///
/// # Examples
///
/// ```
/// use gmp_common::human_time::progress_bar;
///
/// assert_eq!(progress_bar(30, 60, 4), "▰▰▱▱");
/// assert_eq!(progress_bar(10, 0, 3), "▱▱▱");
/// ```
pub fn progress_bar(elapsed: u64, total: u64, width: usize) -> String {
    if total == 0 {
        return EMPTY.to_string().repeat(width);
    }

    let ratio = (elapsed as f64 / total as f64).clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;

    let mut bar = String::with_capacity(width * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(width - filled));
    bar
}
