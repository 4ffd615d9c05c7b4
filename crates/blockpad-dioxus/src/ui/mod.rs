pub mod app;
pub mod components;
pub mod context;

pub use app::App;
