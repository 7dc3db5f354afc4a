use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

// Panel colors sit between the sky gradient's blue and pink.
pub const BG_PURE_BLACK: Color32 = Color32::from_rgb(0, 0, 0);
pub const BG_PANEL: Color32 = Color32::from_rgb(18, 20, 28);
pub const BG_WIDGET: Color32 = Color32::from_rgb(28, 31, 42);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(40, 44, 60);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(54, 58, 80);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(190, 192, 200);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 124, 136);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(235, 236, 240);

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(92, 190, 120);
pub const ACCENT_RED: Color32 = Color32::from_rgb(200, 70, 70);
pub const ACCENT_BLUE: Color32 = Color32::from_rgb(135, 206, 235);
pub const ACCENT_PURPLE: Color32 = Color32::from_rgb(238, 144, 236);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(230, 160, 80);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(60, 70, 90, 77);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(135, 206, 235);

fn widget(
    bg_fill: Color32,
    weak_bg_fill: Color32,
    border: Color32,
    text: Color32,
    expansion: f32,
) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill,
        weak_bg_fill,
        bg_stroke: Stroke::new(1.0, border),
        rounding: Rounding::same(4.0),
        fg_stroke: Stroke::new(1.0, text),
        expansion,
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    style.visuals = Visuals {
        dark_mode: true,
        override_text_color: Some(TEXT_PRIMARY),

        widgets: egui::style::Widgets {
            noninteractive: widget(BG_WIDGET, BG_PANEL, BORDER_SUBTLE, TEXT_MUTED, 0.0),
            inactive: widget(BG_WIDGET, BG_WIDGET, BORDER_SUBTLE, TEXT_PRIMARY, 0.0),
            hovered: widget(BG_WIDGET_HOVER, BG_WIDGET_HOVER, BORDER_ACCENT, TEXT_BRIGHT, 1.0),
            active: egui::style::WidgetVisuals {
                bg_stroke: Stroke::new(2.0, ACCENT_PURPLE),
                ..widget(BG_WIDGET_ACTIVE, BG_WIDGET_ACTIVE, ACCENT_PURPLE, TEXT_BRIGHT, 1.0)
            },
            open: widget(BG_WIDGET_ACTIVE, BG_WIDGET_ACTIVE, BORDER_ACCENT, TEXT_BRIGHT, 0.0),
        },

        selection: egui::style::Selection {
            bg_fill: ACCENT_PURPLE.gamma_multiply(0.4),
            stroke: Stroke::new(1.0, ACCENT_PURPLE),
        },

        hyperlink_color: ACCENT_BLUE,
        faint_bg_color: BG_PANEL,
        extreme_bg_color: BG_PURE_BLACK,
        code_bg_color: BG_PURE_BLACK,
        warn_fg_color: ACCENT_ORANGE,
        error_fg_color: ACCENT_RED,

        window_rounding: Rounding::same(6.0),
        window_shadow: egui::epaint::Shadow {
            offset: egui::vec2(0.0, 4.0),
            blur: 16.0,
            spread: 0.0,
            color: Color32::from_black_alpha(128),
        },
        window_fill: BG_PANEL,
        window_stroke: Stroke::new(1.0, BORDER_SUBTLE),

        panel_fill: BG_PANEL,

        popup_shadow: egui::epaint::Shadow {
            offset: egui::vec2(0.0, 2.0),
            blur: 8.0,
            spread: 0.0,
            color: Color32::from_black_alpha(100),
        },

        resize_corner_size: 12.0,
        text_cursor: egui::style::TextCursorStyle {
            stroke: Stroke::new(2.0, ACCENT_PURPLE),
            ..Default::default()
        },
        clip_rect_margin: 3.0,
        button_frame: true,
        collapsing_header_frame: false,
        indent_has_left_vline: true,
        striped: false,
        slider_trailing_fill: true,
        handle_shape: egui::style::HandleShape::Circle,
        interact_cursor: None,
        image_loading_spinners: true,
        numeric_color_space: egui::style::NumericColorSpace::GammaByte,
        menu_rounding: Rounding::same(4.0),
        window_highlight_topmost: true,
    };

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.indent = 18.0;
    style.spacing.slider_width = 160.0;

    style.text_styles = [
        (
            TextStyle::Small,
            FontId::new(11.0, FontFamily::Proportional),
        ),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (
            TextStyle::Button,
            FontId::new(14.0, FontFamily::Proportional),
        ),
        (
            TextStyle::Heading,
            FontId::new(18.0, FontFamily::Proportional),
        ),
        (
            TextStyle::Monospace,
            FontId::new(13.0, FontFamily::Monospace),
        ),
    ]
    .into();

    ctx.set_style(style);
}
