//! SVG export of editor scenes.
//!
//! Layers are emitted as `<g>` groups in drawing order. Every group except
//! the hit surface carries `pointer-events="none"`.

use glam::DVec2;
use wflop_editor_core::CursorHint;

use crate::{palette, Color, Layer, Rect, Scene};

const PRECISION: usize = 2;

/// Convert a color to a CSS hex string (#RRGGBB).
fn color_to_hex(color: Color) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        (color.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.blue.clamp(0.0, 1.0) * 255.0).round() as u8
    )
}

fn fill(color: Color) -> String {
    format!(
        "fill=\"{}\" fill-opacity=\"{}\"",
        color_to_hex(color),
        color.alpha
    )
}

fn stroke(color: Color, width: f32) -> String {
    format!(
        "stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{width}\"",
        color_to_hex(color),
        color.alpha
    )
}

fn coord(value: f64) -> String {
    format!("{value:.prec$}", prec = PRECISION)
}

fn points(vertices: &[DVec2]) -> String {
    vertices
        .iter()
        .map(|vertex| format!("{},{}", coord(vertex.x), coord(vertex.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn rect(bounds: &Rect, attributes: &str) -> String {
    format!(
        "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {attributes}/>\n",
        coord(bounds.origin.x),
        coord(bounds.origin.y),
        coord(bounds.size.x),
        coord(bounds.size.y)
    )
}

fn cursor_keyword(cursor: CursorHint) -> &'static str {
    match cursor {
        CursorHint::Default => "default",
        CursorHint::Pointer => "pointer",
        CursorHint::Wait => "wait",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layer_body(scene: &Scene, layer: Layer) -> String {
    let mut body = String::new();
    match layer {
        Layer::Wakes => {
            let style = format!(
                "{} {}",
                fill(palette::WAKE_FILL),
                stroke(palette::WAKE_STROKE, palette::WAKE_STROKE_WIDTH)
            );
            for wake in &scene.wakes {
                body.push_str(&format!(
                    "    <polygon points=\"{}\" {style}/>\n",
                    points(wake.vertices())
                ));
            }
        }
        Layer::Turbines => {
            let blade_style = format!(
                "{} {}",
                fill(palette::BLADE_FILL),
                stroke(palette::BLADE_STROKE, palette::BLADE_STROKE_WIDTH)
            );
            for glyph in &scene.turbines {
                body.push_str(&rect(&glyph.tower, &fill(palette::TOWER)));
                for blade in &glyph.blades {
                    body.push_str(&format!(
                        "    <polygon points=\"{}\" {blade_style}/>\n",
                        points(blade)
                    ));
                }
                body.push_str(&format!(
                    "    <circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>\n",
                    coord(glyph.hub.x),
                    coord(glyph.hub.y),
                    coord(glyph.hub_radius),
                    fill(palette::HUB)
                ));
            }
        }
        Layer::GridLines => {
            let style = stroke(palette::GRID_LINE, palette::GRID_LINE_WIDTH);
            for line in &scene.grid_lines {
                body.push_str(&format!(
                    "    <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {style}/>\n",
                    coord(line.from.x),
                    coord(line.from.y),
                    coord(line.to.x),
                    coord(line.to.y)
                ));
            }
        }
        Layer::Occupancy => {
            for highlight in &scene.occupancy {
                body.push_str(&rect(&highlight.bounds, &fill(palette::OCCUPANCY)));
            }
        }
        Layer::HitSurface => {
            let bounds = scene.hit_surface.bounds();
            if scene.cursor == CursorHint::Wait {
                body.push_str(&rect(
                    &bounds,
                    &format!("{} pointer-events=\"none\"", fill(palette::EVALUATING_VEIL)),
                ));
            }
            body.push_str(&rect(
                &bounds,
                &format!(
                    "fill=\"#000000\" fill-opacity=\"0\" cursor=\"{}\"",
                    cursor_keyword(scene.cursor)
                ),
            ));
        }
    }
    body
}

/// Serializes the scene into a standalone SVG document.
///
/// Status lines are written as leading comments.
#[must_use]
pub fn render_svg(scene: &Scene) -> String {
    let size = scene.canvas_size;
    let mut svg = String::with_capacity(4096);

    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {size} {size}\">\n"
    ));
    for line in scene.status.lines() {
        svg.push_str(&format!("  <!-- {} -->\n", escape(&line).replace("--", "- -")));
    }
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{size}\" height=\"{size}\" {} pointer-events=\"none\"/>\n",
        fill(palette::BACKGROUND)
    ));

    for layer in Layer::BACK_TO_FRONT {
        let pointer_events = if layer.captures_pointer() {
            ""
        } else {
            " pointer-events=\"none\""
        };
        svg.push_str(&format!("  <g id=\"{}\"{pointer_events}>\n", layer.name()));
        svg.push_str(&layer_body(scene, layer));
        svg.push_str("  </g>\n");
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneStatus;
    use wflop_editor_core::{
        grid::{CanvasConfig, Viewport},
        Layout, Placement, WakePolygon,
    };

    fn scene() -> Scene {
        let canvas = CanvasConfig::new(4, 200.0, Viewport::new(500.0, 500.0)).expect("canvas");
        let layout = Layout::new(
            Placement::from_indices(4, [5]).expect("placement"),
            Some(12.0),
        );
        let wake = WakePolygon::new(
            DVec2::new(0.0, 1.0),
            DVec2::new(10.0, 2.0),
            DVec2::new(10.0, -2.0),
            DVec2::new(0.0, -1.0),
        );
        Scene::compose(
            &canvas,
            &layout,
            vec![wake],
            None,
            SceneStatus {
                fitness: Some(12.0),
                turbines: 1,
                ..SceneStatus::default()
            },
        )
        .expect("scene")
    }

    #[test]
    fn hex_encoding_matches_palette() {
        assert_eq!(color_to_hex(palette::WAKE_STROKE), "#ff6b6b");
        assert_eq!(color_to_hex(palette::OCCUPANCY), "#90ee90");
    }

    #[test]
    fn layers_appear_in_drawing_order() {
        let svg = render_svg(&scene());
        let positions: Vec<usize> = Layer::BACK_TO_FRONT
            .iter()
            .map(|layer| {
                svg.find(&format!("<g id=\"{}\"", layer.name()))
                    .expect("layer group present")
            })
            .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn only_hit_surface_accepts_pointer_events() {
        let svg = render_svg(&scene());

        assert!(svg.contains("<g id=\"hit-surface\">"));
        for layer in ["wakes", "turbines", "grid", "occupancy"] {
            assert!(
                svg.contains(&format!("<g id=\"{layer}\" pointer-events=\"none\">")),
                "{layer} must ignore pointer input"
            );
        }
    }

    #[test]
    fn hit_surface_carries_cursor_affordance() {
        let idle = render_svg(&scene());
        assert!(idle.contains("fill-opacity=\"0\" cursor=\"default\""));
        assert!(!idle.contains("fill-opacity=\"0.3\""));

        let evaluating = render_svg(&scene().with_cursor(CursorHint::Wait));
        assert!(evaluating.contains("cursor=\"wait\""));
        assert!(evaluating.contains(&format!(
            "fill=\"{}\" fill-opacity=\"0.3\" pointer-events=\"none\"",
            color_to_hex(palette::EVALUATING_VEIL)
        )));
    }

    #[test]
    fn geometry_is_serialized() {
        let svg = render_svg(&scene());

        assert!(svg.contains("points=\"0.00,1.00 10.00,2.00 10.00,-2.00 0.00,-1.00\""));
        assert_eq!(svg.matches("<polygon").count(), 1 + 3);
        assert_eq!(svg.matches("<line").count(), 10);
        assert!(svg.contains("<!-- Fitness: 12.0000 -->"));
    }
}
