use std::time::SystemTime;

use time::{OffsetDateTime, macros::format_description};

const UNFORMATTABLE_TIMESTAMP: &str = "????-??-?? ??:??:??";

pub trait SystemTimeExt {
    /// Renders the instant as `YYYY-MM-DD HH:MM:SS` in UTC.
    fn to_timestamp_string(&self) -> String;
}

impl SystemTimeExt for SystemTime {
    fn to_timestamp_string(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        OffsetDateTime::from(*self)
            .format(format)
            .unwrap_or_else(|_| UNFORMATTABLE_TIMESTAMP.to_string())
    }
}
