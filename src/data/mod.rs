//! Data stores backing the review UI.
//!
//! Each store is a cheap-to-clone handle over shared state and a shared
//! [`FetchCache`](crate::cache::FetchCache). Stores are mutated only through
//! their own fetch/invalidate operations; the merged view is derived on read.

mod approval;
mod by_employee;
mod employees;
mod merge;
mod paginated;
mod session;

pub use approval::{ApprovalOverlay, ApprovalSubmitter};
pub use by_employee::EmployeeTransactions;
pub use employees::EmployeeDirectory;
pub use merge::{merge_transactions, transaction_views, TransactionView};
pub use paginated::{FeedStatus, PaginatedTransactions};
pub use session::ReviewSession;
