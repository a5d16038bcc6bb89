pub(crate) mod notifications;
pub(crate) mod scheduler;
