pub mod error;
pub mod label;
pub mod mail;
pub mod types;

pub use error::{Result, StoreError};
pub use label::{Label, LabelStore};
pub use mail::{MailRecord, MailboxStore};
pub use types::{GroupId, LabelId, MailId};
