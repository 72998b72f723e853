//! Static companion page for the generated data file.

pub mod html;

pub use html::render_sunburst_page;
