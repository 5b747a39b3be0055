//! Core IMAP types.

mod capability;
mod flag;
mod identifiers;
mod mailbox;
mod response_code;
pub mod utf7;

pub use capability::{Capability, Status};
pub use flag::Flag;
pub use identifiers::{Tag, Uid, UidSet};
pub use mailbox::{ListResponse, Mailbox, MailboxAttribute, MailboxStatus};
pub use response_code::ResponseCode;
