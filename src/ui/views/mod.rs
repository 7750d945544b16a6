pub mod transactions;

pub use transactions::draw_transaction_list;
