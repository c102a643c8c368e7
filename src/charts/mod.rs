//! Charts module - Static chart rendering

mod palette;
mod renderer;

pub use renderer::{RenderError, StaticChartRenderer};
