pub mod save_flow;
pub mod surface_sync;
pub mod tab_lifecycle;
