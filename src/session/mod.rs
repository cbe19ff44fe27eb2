//! State holders for the app's screens. Each keeps what its screen displays,
//! owns any live subscription for as long as it exists, and reports
//! user-facing outcomes as [`Notice`]s instead of failing.

use derive_more::Display;
use log::*;

pub mod account;
pub mod browser;
pub mod detail;
pub mod inbox;
pub mod profile;
pub mod trip_form;

pub use browser::TripBrowser;
pub use detail::TripDetail;
pub use inbox::Inbox;
pub use trip_form::TripForm;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Notice {
    #[display(fmt = "{}", _0)]
    Info(String),
    #[display(fmt = "{}", _0)]
    Failure(String),
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failure(_))
    }
}

#[derive(Debug, Default)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.0.push(Notice::Info(text));
    }

    pub fn failure(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{}", text);
        self.0.push(Notice::Failure(text));
    }

    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.0)
    }
}
