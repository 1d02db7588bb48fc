//! Renderer scripts for the per-station figures.
//!
//! Two figures per station:
//! - power spectral density of the residuals with the modelled spectrum and
//!   its confidence band (`psd_figures/`)
//! - the fitted series and its residuals against decimal years
//!   (`data_figures/`)
//!
//! Scripts read the spectrum outputs from the station workspace (the
//! renderer's working directory) and write figures with absolute paths.

use std::path::PathBuf;

use crate::domain::{MJD_J2000, Station};
use crate::io::RunLayout;

/// Seconds per Julian year; converts Hz to cycles per year.
const SECONDS_PER_YEAR: f64 = 31_557_600.0;

/// One renderer script and the figure files it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotScript {
    /// Script file name inside the station workspace.
    pub file_name: &'static str,
    pub text: String,
    /// PostScript figure written by the renderer.
    pub postscript: PathBuf,
    /// Encapsulated PostScript produced by the first conversion step.
    pub eps: PathBuf,
    /// Final raster image.
    pub png: PathBuf,
}

impl PlotScript {
    /// Arguments for `gmt psconvert` (PostScript → EPS).
    pub fn psconvert_args(&self) -> Vec<String> {
        vec![
            "psconvert".to_string(),
            "-Te".to_string(),
            "-A0.1".to_string(),
            self.postscript.to_string_lossy().into_owned(),
        ]
    }

    /// Arguments for ImageMagick `convert` (EPS → PNG).
    pub fn image_convert_args(&self) -> Vec<String> {
        vec![
            "-density".to_string(),
            "300".to_string(),
            "-flatten".to_string(),
            "-antialias".to_string(),
            self.eps.to_string_lossy().into_owned(),
            self.png.to_string_lossy().into_owned(),
        ]
    }
}

pub fn psd_script(station: &Station, layout: &RunLayout) -> PlotScript {
    let dir = layout.psd_figures_dir();
    let id = station.id();
    let postscript = dir.join(format!("{id}_psd.ps"));

    let mut out = String::new();
    out.push_str("set terminal postscript enhanced size 4,4 color portrait solid \"Helvetica\"\n");
    out.push_str(&format!("set output '{}'\n", postscript.display()));
    out.push_str("set border 3;\n");
    out.push_str("set xlabel 'Frequency (cpy)' font 'Helvetica, 18';\n");
    out.push_str("set ylabel 'Power (mm^2/cpy)' offset -1,0 font 'Helvetica, 18'\n");
    axes(&mut out);
    out.push_str("set logscale xy;\n");
    out.push_str("set nokey;\n");
    out.push_str("set format y '10^{%T}';\n");
    out.push_str("set format x '10^{%T}';\n");
    out.push_str("set pointsize 1;\n");
    out.push_str("set xrange[*:*];\n");
    out.push_str("set yrange[*:*];\n");
    out.push_str(&format!("s={SECONDS_PER_YEAR:.1};\n"));
    out.push_str("set style line 1 lt 1 lw 3 pt 7 linecolor rgb \"#a6cee3\"\n");
    out.push_str("set style line 2 lt 1 lw 3 pt 7 linecolor rgb \"red\"\n");
    out.push_str("set style line 3 lt 1 lw 1 pt 7 linecolor rgb \"red\"\n");
    out.push_str("plot 'estimatespectrum.out' using ($1*s):($2/s) w p ls 1,\\\n");
    out.push_str("     'modelspectrum.out' using ($1*s):($2/s) w l ls 2,\\\n");
    out.push_str("     'modelspectrum_percentiles.out' u ($1*s):($2/s) w l ls 3,\\\n");
    out.push_str("     'modelspectrum_percentiles.out' u ($1*s):($4/s) w l ls 3\n");

    PlotScript {
        file_name: "plot_spectra.gpl",
        text: out,
        eps: postscript.with_extension("eps"),
        png: dir.join(format!("{id}.png")),
        postscript,
    }
}

pub fn data_script(station: &Station, layout: &RunLayout) -> PlotScript {
    let dir = layout.data_figures_dir();
    let id = station.id();
    let postscript = dir.join(format!("{id}_data.ps"));
    let residuals = dir.join(format!("{id}_res.eps"));
    let fitted = layout.fitted_dir().join(station.file_name());
    let years = format!("(($1-{MJD_J2000:.0})/365.25+2000)");

    let mut out = String::new();
    out.push_str("set terminal postscript enhanced size 8,4.8 color portrait solid 'Helvetica'\n");
    out.push_str(&format!("set output '{}'\n", postscript.display()));
    out.push_str("set border 3;\n");
    out.push_str("set xlabel 'Years' font 'Helvetica, 18';\n");
    out.push_str("set ylabel 'mm' offset -1,0 font 'Helvetica, 18';\n");
    axes(&mut out);
    out.push_str("set nokey;\n");
    out.push_str("set pointsize 0.4;\n");
    out.push_str("set bar 0.5;\n");
    out.push_str("set xrange[*:*];\n");
    out.push_str("set yrange[*:*];\n");
    out.push_str("set style line 1 lt 1 lw 3 pt 7 linecolor rgb '#a6cee3'\n");
    out.push_str("set style line 2 lt 1 lw 3 pt 7 linecolor rgb 'red'\n");
    out.push_str("set style line 3 lt 1 lw 3 pt 2 linecolor rgb 'black'\n");
    out.push_str(&format!("plot '{}' u {years}:2 w p ls 1,\\\n", fitted.display()));
    out.push_str(&format!("     '{}' u {years}:3 w l ls 2\n", fitted.display()));
    out.push('\n');
    // Residuals go straight to EPS; only the main figure is converted.
    out.push_str("set terminal postscript eps enhanced size 8,4.8 color solid 'Helvetica'\n");
    out.push_str(&format!("set output '{}'\n", residuals.display()));
    out.push_str(&format!("plot '{}' u {years}:($2-$3) w l ls 2\n", fitted.display()));

    PlotScript {
        file_name: "plot_data.gpl",
        text: out,
        eps: postscript.with_extension("eps"),
        png: dir.join(format!("{id}.png")),
        postscript,
    }
}

fn axes(out: &mut String) {
    out.push_str("set xtics nomirror;\n");
    out.push_str("set xtics autofreq;\n");
    out.push_str("set ytics nomirror;\n");
    out.push_str("set ytics autofreq;\n");
}
