use std::path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::arrayops;
use crate::line_fit::{DoubletFit, Spectrum};

const SIZE: (u32, u32) = (800, 480);

/// The end points of the vertical markers drawn at each fitted line center,
/// spanning zero to `ymax`.
pub fn center_markers(fit: &DoubletFit, ymax: f64) -> [[(f64, f64); 2]; 2] {
    [fit.params.center1, fit.params.center2].map(|center| [(center, 0.0), (center, ymax)])
}

/// Render the fit as an SVG file at `path`
pub fn draw_fit_svg_file<P>(
    spectrum: &Spectrum,
    fit: &DoubletFit,
    path: P,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: AsRef<path::Path>,
{
    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    draw_fit_on(&root, spectrum, fit)
}

/// Render the fit as an SVG document held in memory
pub fn draw_fit_svg_string(
    spectrum: &Spectrum,
    fit: &DoubletFit,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, SIZE).into_drawing_area();
        draw_fit_on(&root, spectrum, fit)?;
    }
    Ok(buffer)
}

/// Draw the observed spectrum, the fitted model and dashed markers at both fitted
/// line centers onto `root`.
///
/// The flux axis runs from zero to the largest observed flux.
pub fn draw_fit_on<DB>(
    root: &DrawingArea<DB, Shift>,
    spectrum: &Spectrum,
    fit: &DoubletFit,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (xmin, xmax) = arrayops::minmax(&spectrum.wavelength);
    let ymax = spectrum.max_flux();
    let ymax = if ymax > 0.0 { ymax } else { 1.0 };

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .caption("Emission Line Fit", ("sans-serif", 20).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(xmin..xmax, 0.0..ymax)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Wavelength")
        .axis_desc_style(("sans-serif", 16).into_font())
        .y_desc("Flux")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            spectrum.iter(),
            ShapeStyle {
                color: BLACK.mix(1.0),
                filled: false,
                stroke_width: 1,
            },
        ))?
        .label("data")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    let predicted = fit.predict(&spectrum.wavelength);
    chart
        .draw_series(LineSeries::new(
            spectrum.wavelength.iter().copied().zip(predicted),
            RED.stroke_width(2),
        ))?
        .label("model")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    for marker in center_markers(fit, ymax) {
        chart.draw_series(DashedLineSeries::new(
            marker,
            6,
            4,
            BLUE.mix(0.75).stroke_width(1),
        ))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
