pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, header, info, load_outcome, muted, section, status, success, summary_row,
    verdict, warn,
};
pub use progress::Spinner;
pub use table::{result_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
