pub mod leave_date;
pub mod title;

pub use title::{build_title, Identity};
