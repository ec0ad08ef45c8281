//! Password-reset and email-change confirmation on top of split tokens.

mod clock;
mod config;
mod error;
mod event;
mod mailer;
mod record;
mod store;
mod utils;
mod workflow;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ConfirmationConfig;
pub use error::{ConfirmError, IssueError};
pub use event::ConfirmationEvent;
pub use mailer::{ConfirmationMail, LogMailer, Mailer};
pub use record::{PendingTokenRecord, Purpose};
pub use store::{ApplyOutcome, PendingTokenStore, Subject, SubjectChange, SubjectDirectory};
pub use workflow::{Confirmation, ConfirmationWorkflow, IssueOutcome, IssueReceipt};
