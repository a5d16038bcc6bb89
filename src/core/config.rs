mod parsing;
mod settings;
mod types;

pub(crate) use types::{ConfigError, Settings};
#[allow(unused_imports)]
pub(crate) use types::{
    AuthoringSettings, Environment, NotificationSettings, StorageSettings, TelemetrySettings,
};
