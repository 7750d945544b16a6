pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{approval_color, approval_marker, clamp_selection, format_amount, truncate};
