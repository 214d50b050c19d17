// src/gui.rs
use eframe::egui;
use egui::{Color32, Vec2};
use log::error;

use meaview::mea::{MeaError, Visualization};
use meaview::types::*;
use crate::visualizer;

const Y_SCALE_STEP: f64 = 1.25;

pub struct MeaViewerApp {
    vis: Visualization,
    electrode_input: String,
    last_drag_delta: Vec2,
    log_messages: Vec<String>,
}

impl MeaViewerApp {
    pub fn new(vis: Visualization) -> Self {
        let electrode_input = vis.viewport().electrodes().join(",");
        let recording = vis.recording();
        let ready = format!(
            "{} channels, {:.1} s @ {:.0} Hz",
            recording.channel_count(),
            recording.end_time() - recording.start_time(),
            recording.sample_rate()
        );
        Self {
            vis,
            electrode_input,
            last_drag_delta: Vec2::ZERO,
            log_messages: vec![ready],
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn report<T>(&mut self, result: Result<T, MeaError>) {
        if let Err(err) = result {
            error!("{err}");
            self.log(&err.to_string());
        }
    }

    fn send(&mut self, event: ViewEvent) {
        let result = self.vis.handle(event);
        self.report(result);
    }

    fn scale_y(&mut self, factor: f64) {
        let target = self.vis.viewport().y_scale() * factor;
        let result = self.vis.set_y_scale(target);
        self.report(result);
    }

    fn switch_mode(&mut self, mode: ViewMode) {
        if self.vis.viewport().mode() != mode {
            let result = self.vis.set_mode(mode);
            self.report(result);
        }
    }

    fn apply_electrodes(&mut self) {
        let names: Vec<String> = self
            .electrode_input
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        let result = self.vis.set_electrodes(names);
        self.report(result);
    }

    /// Maps egui pointer state on the canvas into viewport events.
    fn canvas_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let rect = response.rect;
        let (width, height) = self.vis.viewport().canvas_size();
        if (rect.width() as f64, rect.height() as f64) != (width, height) {
            self.send(ViewEvent::Resize {
                width: rect.width() as f64,
                height: rect.height() as f64,
            });
        }

        let latest = ui.input(|i| i.pointer.latest_pos());
        let Some(screen) = latest else {
            return;
        };
        let local = screen - rect.min;
        let pos = Pointer::new(local.x as f64, local.y as f64);

        if response.drag_started() {
            self.send(ViewEvent::MousePress { pos });
        }
        if response.dragged() {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                self.last_drag_delta = delta;
            }
            let last = Pointer::new(pos.x - delta.x as f64, pos.y - delta.y as f64);
            self.send(ViewEvent::MouseMove {
                pos,
                last,
                dragging: true,
            });
        } else if response.hovered() && ui.input(|i| i.pointer.delta()) != Vec2::ZERO {
            self.send(ViewEvent::MouseMove {
                pos,
                last: pos,
                dragging: false,
            });
        }
        if response.drag_released() {
            let d = std::mem::replace(&mut self.last_drag_delta, Vec2::ZERO);
            let last = Pointer::new(pos.x - d.x as f64, pos.y - d.y as f64);
            self.send(ViewEvent::MouseRelease { pos, last });
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.scroll_delta.y);
            if scroll != 0.0 {
                self.send(ViewEvent::Wheel {
                    delta: scroll as f64,
                    pos,
                });
            }
        }
        if response.double_clicked() {
            self.send(ViewEvent::DoubleClick { pos });
            self.electrode_input = self.vis.viewport().electrodes().join(",");
        }
    }
}

impl eframe::App for MeaViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
            self.scale_y(Y_SCALE_STEP);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
            self.scale_y(1.0 / Y_SCALE_STEP);
        }

        self.send(ViewEvent::Tick);
        if self.vis.viewport().pan_velocity() != 0.0 {
            ctx.request_repaint();
        }

        egui::SidePanel::left("L").min_width(220.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("MEA viewer");
            ui.separator();

            let mode = self.vis.viewport().mode();
            ui.horizontal(|ui| {
                if ui.selectable_label(mode == ViewMode::Grid, "GRID").clicked() {
                    self.switch_mode(ViewMode::Grid);
                }
                if ui.selectable_label(mode == ViewMode::Trace, "TRACE").clicked() {
                    self.switch_mode(ViewMode::Trace);
                }
            });

            ui.add_space(10.0);
            ui.label("ELECTRODES");
            let edit = ui.text_edit_singleline(&mut self.electrode_input);
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("APPLY").clicked() || submitted {
                self.apply_electrodes();
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                ui.label(format!("Y scale: {:.1} µV", self.vis.viewport().y_scale()));
                if ui.small_button("+").clicked() {
                    self.scale_y(1.0 / Y_SCALE_STEP);
                }
                if ui.small_button("-").clicked() {
                    self.scale_y(Y_SCALE_STEP);
                }
            });
            ui.label(format!("Cursor: {:.3} s", self.vis.viewport().mouse_t()));

            ui.add_space(20.0);
            ui.separator();
            egui::ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(egui::RichText::new(self.vis.status_text()).monospace().color(Color32::LIGHT_GRAY));
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                self.canvas_input(ui, &response);
                let top_margin_px = self.vis.viewport().config().top_margin_px as f32;
                visualizer::draw_frame(&painter, response.rect, self.vis.frame(), top_margin_px);
            });
    }
}
