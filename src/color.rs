use plotters::style::RGBColor;

/// color of the smoothed line drawn over bars of the given color.
/// Every name maps to something, unknown colors fall back to moccasin.
pub fn smoothed_color(bar_color: &str) -> &'static str {
    let name = bar_color.trim().to_ascii_lowercase();
    match name.as_str() {
        "red" | "lightcoral" => "crimson",
        "black" => "midnightblue",
        "silver" | "gainsboro" => "black",
        n if n.contains("gray") || n.contains("grey") => "black",
        "green" => "limegreen",
        _ => "moccasin",
    }
}

/// RGB value of a CSS color name
pub fn named_color(name: &str) -> Option<RGBColor> {
    let rgb = match name.trim().to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "lightcoral" => (240, 128, 128),
        "crimson" => (220, 20, 60),
        "midnightblue" => (25, 25, 112),
        "navy" => (0, 0, 128),
        "blue" => (0, 0, 255),
        "steelblue" => (70, 130, 180),
        "dimgray" | "dimgrey" => (105, 105, 105),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "silver" => (192, 192, 192),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "gainsboro" => (220, 220, 220),
        "green" => (0, 128, 0),
        "limegreen" => (50, 205, 50),
        "moccasin" => (255, 228, 181),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}
