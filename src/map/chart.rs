use plotters::coord::Shift;
use plotters::prelude::*;

use crate::color::{to_rgb8, DepthColorMapper};
use crate::prelude::*;
use crate::station::Station;

use super::{error_bar, marker, point_color, ColorBy, MapConfig, Marker, Panel};

const COLORBAR_HEIGHT: i32 = 90;
const COLORBAR_SLICES: usize = 128;

fn plot_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

pub(super) fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    config: &MapConfig,
    panels: &[Panel],
    stations: &[Station],
    cols: usize,
    mapper: &DepthColorMapper,
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_error)?;

    let (_, height) = root.dim_in_pixel();
    let (maps, colorbar) = root.split_vertically(height as i32 - COLORBAR_HEIGHT);
    let rows = (panels.len() + cols - 1) / cols;
    let areas = maps.split_evenly((rows, cols));
    for (area, panel) in areas.iter().zip(panels.iter()) {
        draw_panel(area, config, panel, stations, mapper)?;
    }
    if config.color_by == ColorBy::Depth {
        draw_colorbar(&colorbar, mapper)?;
    }

    root.present().map_err(plot_error)?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    config: &MapConfig,
    panel: &Panel,
    stations: &[Station],
    mapper: &DepthColorMapper,
) -> Result<()> {
    let extent = config.extent;
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title.as_str(), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(extent.lon_range(), extent.lat_range())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_labels(6)
        .y_labels(6)
        .x_label_formatter(&|x| format!("{:.2}°E", x))
        .y_label_formatter(&|y| format!("{:.2}°N", y))
        .draw()
        .map_err(plot_error)?;

    if config.error_bars {
        let style = RGBColor(128, 128, 128).mix(0.5).stroke_width(1);
        let bars = panel.catalog.iter().filter_map(|h| {
            let (d_lon, d_lat) = error_bar(h)?;
            Some([
                PathElement::new(vec![(h.lon - d_lon, h.lat), (h.lon + d_lon, h.lat)], style),
                PathElement::new(vec![(h.lon, h.lat - d_lat), (h.lon, h.lat + d_lat)], style),
            ])
        });
        chart.draw_series(bars.flatten()).map_err(plot_error)?;
    }

    // catalog order is kept, later rows land on top
    let circles = panel
        .catalog
        .iter()
        .filter(|h| marker(&h.method) == Marker::Circle)
        .map(|h| {
            let (r, g, b) = point_color(config, mapper, h);
            EmptyElement::at((h.lon, h.lat))
                + Circle::new((0, 0), 4, RGBColor(r, g, b).mix(0.8).filled())
                + Circle::new((0, 0), 4, BLACK.stroke_width(1))
        });
    chart.draw_series(circles).map_err(plot_error)?;

    let squares = panel
        .catalog
        .iter()
        .filter(|h| marker(&h.method) == Marker::Square)
        .map(|h| {
            let (r, g, b) = point_color(config, mapper, h);
            EmptyElement::at((h.lon, h.lat))
                + Rectangle::new([(-5, -5), (5, 5)], RGBColor(r, g, b).mix(0.9).filled())
                + Rectangle::new([(-5, -5), (5, 5)], BLACK.stroke_width(1))
        });
    chart.draw_series(squares).map_err(plot_error)?;

    chart
        .draw_series(
            stations
                .iter()
                .map(|s| Cross::new((s.lon, s.lat), 7, BLACK.stroke_width(2))),
        )
        .map_err(plot_error)?;

    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    mapper: &DepthColorMapper,
) -> Result<()> {
    let range = mapper.range();
    let (width, _) = area.dim_in_pixel();
    let side = (width / 4) as i32;

    let mut bar = ChartBuilder::on(area)
        .margin_left(side)
        .margin_right(side)
        .margin_top(10)
        .margin_bottom(5)
        .x_label_area_size(40)
        .build_cartesian_2d(range.clone(), 0.0..1.0)
        .map_err(plot_error)?;

    bar.configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc("Depth [km]")
        .draw()
        .map_err(plot_error)?;

    let step = (range.end - range.start) / COLORBAR_SLICES as f64;
    bar.draw_series((0..COLORBAR_SLICES).map(|i| {
        let low = range.start + step * i as f64;
        let (r, g, b) = to_rgb8(mapper.color(low + step / 2.0));
        Rectangle::new([(low, 0.0), (low + step, 1.0)], RGBColor(r, g, b).filled())
    }))
    .map_err(plot_error)?;

    Ok(())
}
