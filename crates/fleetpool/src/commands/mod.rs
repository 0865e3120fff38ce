pub mod list;
pub mod regions;
pub mod resize;
pub mod state;
