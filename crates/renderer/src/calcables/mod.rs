pub mod min_max;

pub use min_max::calculate_min_max_y;
