//! Figure generation through an external renderer.

pub mod gnuplot;

pub use gnuplot::{PlotScript, data_script, psd_script};
