use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::export::ExportFormat;
use crate::ui::state::{CELL_SIZE_RANGE, UiState};
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub export: Option<ExportFormat>,
    pub toggle_auto_rotate: bool,
    pub cell_size_changed: bool,
    pub vsync_changed: bool,
    pub reload: bool,
    pub remove_mesh: bool,
}

/// Read-only figures shown in the side panel.
#[derive(Clone, Debug, Default)]
pub struct MeshStats {
    pub image_size: Option<(u32, u32)>,
    pub vertices: usize,
    pub triangles: usize,
    pub world_size: Option<(f32, f32)>,
    pub scale: Option<f32>,
    pub amplitude: Option<f64>,
    pub camera_position: [f32; 3],
    pub radius: f32,
    pub loading: bool,
    pub status: Option<String>,
    pub error: Option<String>,
}

pub fn draw_side_panel(ctx: &Context, state: &mut UiState, stats: &MeshStats) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(260.0)
        .max_width(380.0)
        .default_width(300.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Heightview").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("Heightmap mesh viewer").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                section_header(ui, "EXPORT");
                ui.horizontal(|ui| {
                    for format in ExportFormat::ALL {
                        let button = egui::Button::new(RichText::new(format.label()).color(BG_PURE_BLACK))
                            .fill(ACCENT_BLUE)
                            .min_size(egui::vec2(72.0, 32.0));
                        if ui.add_enabled(stats.triangles > 0, button).clicked() {
                            actions.export = Some(format);
                        }
                    }
                });
                if let Some(path) = &state.last_export {
                    ui.add_space(4.0);
                    ui.label(RichText::new(format!("Saved {}", path.display())).color(ACCENT_GREEN).size(11.0));
                }
                ui.add_space(16.0);

                section_header(ui, "VIEW");
                let (text, color) = if state.auto_rotate {
                    ("Stop rotation", ACCENT_ORANGE)
                } else {
                    ("Auto-rotate", ACCENT_GREEN)
                };
                if ui.add(egui::Button::new(RichText::new(text).color(BG_PURE_BLACK))
                    .fill(color).min_size(egui::vec2(ui.available_width(), 32.0))).clicked() {
                    actions.toggle_auto_rotate = true;
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label("Cell size:");
                    let drag = egui::DragValue::new(&mut state.cell_size)
                        .range(CELL_SIZE_RANGE.0..=CELL_SIZE_RANGE.1)
                        .speed(10.0);
                    if ui.add(drag).changed() {
                        actions.cell_size_changed = true;
                    }
                });
                ui.horizontal(|ui| {
                    if ui.checkbox(&mut state.vsync_enabled, "VSync").changed() {
                        actions.vsync_changed = true;
                    }
                    ui.checkbox(&mut state.show_help, "Help");
                });
                ui.add_space(16.0);

                section_header(ui, "MESH");
                ui.horizontal(|ui| {
                    if ui.button("Reload").clicked() {
                        actions.reload = true;
                    }
                    if ui.add_enabled(stats.vertices > 0, egui::Button::new("Remove")).clicked() {
                        actions.remove_mesh = true;
                    }
                });
                ui.add_space(8.0);
                stats_panel(ui, stats);

                if let Some(status) = &stats.status {
                    ui.add_space(8.0);
                    ui.label(RichText::new(status).color(TEXT_MUTED).size(11.0));
                }
                if let Some(err) = &stats.error {
                    ui.add_space(6.0);
                    error_box(ui, err);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn error_box(ui: &mut Ui, err: &str) {
    egui::Frame::default()
        .fill(Color32::from_rgb(40, 15, 15))
        .stroke(egui::Stroke::new(1.0, ACCENT_RED))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(err).color(ACCENT_RED).size(11.0));
        });
}

fn stats_panel(ui: &mut Ui, stats: &MeshStats) {
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                let image = stats
                    .image_size
                    .map(|(w, h)| format!("{w}x{h}"))
                    .unwrap_or_else(|| "-".to_owned());
                stat_row(ui, "Image", image, TEXT_PRIMARY);
                stat_row(ui, "Vertices", fmt_num(stats.vertices), ACCENT_BLUE);
                stat_row(ui, "Triangles", fmt_num(stats.triangles), ACCENT_PURPLE);

                if let Some((w, d)) = stats.world_size {
                    stat_row(ui, "Extent", format!("{w:.2} x {d:.2}"), TEXT_PRIMARY);
                }
                stat_row(ui, "Scale", fmt_opt(stats.scale.map(f64::from)), TEXT_PRIMARY);
                stat_row(ui, "Amplitude", fmt_opt(stats.amplitude), TEXT_PRIMARY);
                stat_row(ui, "Radius", format!("{:.2}", stats.radius), TEXT_PRIMARY);
            });

            if stats.loading {
                ui.add_space(8.0);
                ui.label(RichText::new("Decoding...").color(ACCENT_ORANGE));
            }
        });
}

fn stat_row(ui: &mut Ui, label: &str, value: String, color: Color32) {
    ui.label(RichText::new(label).color(TEXT_MUTED));
    ui.label(RichText::new(value).color(color));
    ui.end_row();
}

pub fn draw_help_overlay(ctx: &Context, pos: [f32; 3], auto_rotate: bool) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Orbit | Scroll - Zoom | WASD - Pan | Q/E - Dolly").color(TEXT_MUTED));
                    ui.label(RichText::new("R - Auto-rotate | Esc - Quit").color(TEXT_MUTED));
                    let rotate = if auto_rotate { " | rotating" } else { "" };
                    ui.label(RichText::new(format!("Pos: ({:.1}, {:.1}, {:.1}){rotate}", pos[0], pos[1], pos[2])).color(TEXT_MUTED));
                });
        });
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "-".to_owned(),
    }
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_abbreviated() {
        assert_eq!(fmt_num(999), "999");
        assert_eq!(fmt_num(1_500), "1.5K");
        assert_eq!(fmt_num(2_000_000), "2.00M");
    }

    #[test]
    fn missing_values_render_as_dash() {
        assert_eq!(fmt_opt(None), "-");
        assert_eq!(fmt_opt(Some(0.5)), "0.500");
    }
}
