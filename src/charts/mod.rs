//! Charts module - Static chart rendering

mod renderer;

pub use renderer::{
    render_bar, render_pie, BarSpec, ChartError, GroupedBarData, Orientation, BAR_COLOR, PALETTE,
};
