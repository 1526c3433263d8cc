pub mod reminders;
pub mod timers;

pub use reminders::ReminderService;
pub use timers::TimerService;
