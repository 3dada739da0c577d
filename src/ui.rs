//! The egui layer: control bar, image panels and status bar.

use egui::{load::SizedTexture, Color32, ColorImage, RichText, TextureHandle, TextureOptions};
use image::RgbaImage;

use crate::{
    cmd::{Cmd, Mode},
    palette::PaintColor,
    session::{Session, BRUSH_SIZES},
};

const SELECTED_OUTLINE: Color32 = Color32::from_rgb(255, 140, 0);
const DRAWING_FILL: Color32 = Color32::from_rgb(144, 238, 144);
const NAVIGATION_FILL: Color32 = Color32::from_rgb(211, 211, 211);
const CLEAR_FILL: Color32 = Color32::from_rgb(240, 128, 128);

/// GPU textures backing the live feed and canvas panels.
#[derive(Default)]
pub struct Panels {
    feed: Option<TextureHandle>,
    canvas: Option<TextureHandle>,
}

impl Panels {
    pub fn update(&mut self, ctx: &egui::Context, feed: &RgbaImage, canvas: &RgbaImage) {
        upload(ctx, &mut self.feed, "feed", feed);
        upload(ctx, &mut self.canvas, "canvas", canvas);
    }
}

fn upload(ctx: &egui::Context, slot: &mut Option<TextureHandle>, name: &str, img: &RgbaImage) {
    let size = [img.width() as usize, img.height() as usize];
    let image = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    match slot {
        Some(texture) => texture.set(image, TextureOptions::LINEAR),
        None => *slot = Some(ctx.load_texture(name, image, TextureOptions::LINEAR)),
    }
}

/// Lays out the window for one frame and returns the commands issued through the controls.
pub fn show(ctx: &egui::Context, session: &Session, panels: &Panels) -> Vec<Cmd> {
    let mut cmds = Vec::new();

    egui::TopBottomPanel::top("controls").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            swatches(ui, session.color(), &mut cmds);
            ui.separator();
            brush_slider(ui, session.brush_size(), &mut cmds);
            ui.separator();
            mode_buttons(ui, session.mode(), &mut cmds);
        });
        ui.add_space(4.0);
    });

    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.label(session.status());
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.columns(2, |columns| {
            image_panel(&mut columns[0], "Camera", panels.feed.as_ref());
            image_panel(&mut columns[1], "Drawing Canvas", panels.canvas.as_ref());
        });
    });

    cmds
}

fn swatches(ui: &mut egui::Ui, selected: PaintColor, cmds: &mut Vec<Cmd>) {
    for color in PaintColor::SWATCHES {
        let [r, g, b] = color.rgb();
        let text = match color {
            PaintColor::Black | PaintColor::Blue => Color32::WHITE,
            _ => Color32::BLACK,
        };
        let mut button = egui::Button::new(RichText::new(color.label()).color(text))
            .fill(Color32::from_rgb(r, g, b))
            .min_size(egui::vec2(64.0, 24.0));
        if color == selected {
            button = button.stroke(egui::Stroke::new(2.0, SELECTED_OUTLINE));
        }
        if ui.add(button).clicked() {
            cmds.push(Cmd::SetColor { color });
        }
    }
}

fn brush_slider(ui: &mut egui::Ui, current: u32, cmds: &mut Vec<Cmd>) {
    let mut size = current;
    let slider = egui::Slider::new(&mut size, BRUSH_SIZES).text("Brush Size");
    if ui.add(slider).changed() && size != current {
        cmds.push(Cmd::SetBrushSize { size });
    }
}

fn mode_buttons(ui: &mut egui::Ui, mode: Mode, cmds: &mut Vec<Cmd>) {
    let (label, fill) = match mode {
        Mode::Drawing => ("Drawing Mode", DRAWING_FILL),
        Mode::Navigation => ("Navigation Mode", NAVIGATION_FILL),
    };
    let toggle = egui::Button::new(RichText::new(label).color(Color32::BLACK)).fill(fill);
    if ui.add(toggle).clicked() {
        cmds.push(Cmd::ToggleMode);
    }

    let clear =
        egui::Button::new(RichText::new("Clear Canvas").color(Color32::BLACK)).fill(CLEAR_FILL);
    if ui.add(clear).clicked() {
        cmds.push(Cmd::Clear);
    }
}

fn image_panel(ui: &mut egui::Ui, title: &str, texture: Option<&TextureHandle>) {
    ui.heading(title);
    match texture {
        Some(texture) => {
            ui.add(egui::Image::new(SizedTexture::from_handle(texture)).shrink_to_fit());
        }
        None => {
            ui.label("Waiting for the camera...");
        }
    }
}
