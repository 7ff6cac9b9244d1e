pub mod board;
pub mod changed_area;
pub mod error;
pub mod interactive;
pub mod pull_tight;
pub mod quad_tree;
pub mod settings;
pub mod shove;
pub mod stop;
pub mod via_opt;
