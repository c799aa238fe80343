pub mod history;
pub mod stats;

pub use history::compute_completion_history;
pub use stats::{
    compute_analytics, completed_on, streak_days, tasks_completed_today_from_history,
    tasks_completed_today_from_tasks, Summary, STREAK_LOOKBACK_DAYS,
};
