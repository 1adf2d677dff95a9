//! SVG heatmap of hourly activity — days down, hours across.
//!
//! Pure string generation; rasterizing to PNG (when a delivery channel needs
//! one) is an external concern. Cell shade encodes the active fraction of
//! the hour on a five-step scale.

use crate::timeline::binner::DailyHourlyBuckets;

const CELL: u32 = 14;
const GAP: u32 = 2;
const LEFT_MARGIN: u32 = 78;
const TOP_MARGIN: u32 = 24;

/// Five-step shade ramp, zero activity first.
const SHADES: [&str; 5] = ["#ebedf0", "#c6e48b", "#7bc96f", "#239a3b", "#196127"];

/// Render one rectangle per (day, hour) with an activity shade.
pub fn render_heatmap(days: &[DailyHourlyBuckets]) -> String {
    let width = LEFT_MARGIN + 24 * (CELL + GAP);
    let height = TOP_MARGIN + days.len() as u32 * (CELL + GAP);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\" font-family=\"sans-serif\" font-size=\"10\">\n"
    ));
    svg.push_str(&format!(
        "<rect width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>\n"
    ));

    // Hour labels every third column.
    for hour in (0..24).step_by(3) {
        let x = LEFT_MARGIN + hour * (CELL + GAP);
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{}\" fill=\"#586069\">{hour:02}</text>\n",
            TOP_MARGIN - 8
        ));
    }

    for (row, day) in days.iter().enumerate() {
        let y = TOP_MARGIN + row as u32 * (CELL + GAP);
        svg.push_str(&format!(
            "<text x=\"4\" y=\"{}\" fill=\"#586069\">{}</text>\n",
            y + CELL - 3,
            day.date.format("%m-%d (%a)")
        ));

        for (hour, bucket) in day.hours.iter().enumerate() {
            let x = LEFT_MARGIN + hour as u32 * (CELL + GAP);
            let shade = shade_for(bucket.active_seconds);
            svg.push_str(&format!(
                "<rect x=\"{x}\" y=\"{y}\" width=\"{CELL}\" height=\"{CELL}\" rx=\"2\" fill=\"{shade}\"/>\n"
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Shade index from the active fraction of one hour.
fn shade_for(active_seconds: f64) -> &'static str {
    let fraction = (active_seconds / 3600.0).clamp(0.0, 1.0);
    let idx = if fraction <= 0.0 {
        0
    } else if fraction < 0.25 {
        1
    } else if fraction < 0.5 {
        2
    } else if fraction < 0.75 {
        3
    } else {
        4
    };
    SHADES[idx]
}
