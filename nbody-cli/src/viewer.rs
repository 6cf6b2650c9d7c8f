//! Interactive viewer for nbody scenarios
//!
//! Draws bodies and their trails each frame and drives the integrator from
//! the frame callback. A scenario loaded from a file is reloaded whenever the
//! file changes on disk.

use crate::trails::Trails;
use crate::viewport::{body_radius, Viewport};
use eframe::egui;
use log::{info, warn};
use nbody_core::{
    build_simulation_context_from_source, get_body_states, reset_simulation, step_simulation,
    DivergenceError, SimulationContext,
};
use notify::{Event, RecommendedWatcher, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

const PALETTE: [egui::Color32; 6] = [
    egui::Color32::from_rgb(255, 204, 64),
    egui::Color32::from_rgb(160, 160, 160),
    egui::Color32::from_rgb(230, 180, 120),
    egui::Color32::from_rgb(90, 150, 255),
    egui::Color32::from_rgb(230, 90, 60),
    egui::Color32::from_rgb(170, 120, 255),
];

/// Where the viewer's scenario text comes from
pub enum ScenarioSource {
    File(PathBuf),
    Preset { name: String, text: &'static str },
}

impl ScenarioSource {
    fn title(&self) -> String {
        match self {
            ScenarioSource::File(path) => path.display().to_string(),
            ScenarioSource::Preset { name, .. } => format!("preset: {}", name),
        }
    }
}

pub struct ViewerApp {
    source: ScenarioSource,
    source_text: String,
    ctx_opt: Option<SimulationContext>,
    last_load_error: Option<String>,
    playing: bool,
    steps_per_frame: usize,
    trails: Trails,
    trail_length: usize,
    scale: f32,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: Option<mpsc::Receiver<notify::Result<Event>>>,
}

impl ViewerApp {
    pub fn new(
        source: ScenarioSource,
        trail_length: usize,
        scale: f32,
        _cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let (source_text, file_watcher, file_receiver) = match &source {
            ScenarioSource::File(path) => {
                let text = std::fs::read_to_string(path)
                    .unwrap_or_else(|e| format!("# error reading {}: {}", path.display(), e));
                let (watcher, rx) = watch_file(path);
                (text, watcher, Some(rx))
            }
            ScenarioSource::Preset { text, .. } => (text.to_string(), None, None),
        };

        let mut app = Self {
            source,
            source_text,
            ctx_opt: None,
            last_load_error: None,
            playing: true,
            steps_per_frame: 1,
            trails: Trails::new(trail_length),
            trail_length,
            scale,
            file_watcher,
            file_receiver,
        };

        app.reload_context();
        app
    }

    fn reload_context(&mut self) {
        self.trails.clear();
        match build_simulation_context_from_source(&self.source_text) {
            Ok((mut ctx, diagnostics)) => {
                for warning in diagnostics.warnings() {
                    warn!("{}", warning);
                }
                // The viewer runs until the user stops it
                ctx.max_steps = None;
                ctx.check_divergence = true;
                info!(
                    "loaded {} with {} bodies",
                    self.source.title(),
                    ctx.integrator.bodies().len()
                );
                self.ctx_opt = Some(ctx);
                self.last_load_error = None;
            }
            Err(e) => {
                warn!("failed to load {}: {}", self.source.title(), e);
                self.last_load_error = Some(e.to_string());
                self.ctx_opt = None;
                self.playing = false;
            }
        }
    }

    fn reset(&mut self) {
        if let Some(ref mut ctx) = self.ctx_opt {
            reset_simulation(ctx);
            // Clears a divergence message; load errors have no context to reset
            self.last_load_error = None;
        }
        self.trails.clear();
    }

    fn check_file_changes(&mut self) {
        let (ScenarioSource::File(path), Some(rx)) = (&self.source, &self.file_receiver) else {
            return;
        };

        let path = path.clone();
        let mut changed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                Ok(Event { kind, paths, .. }) => {
                    let touches_source = paths
                        .iter()
                        .any(|p| p.file_name().is_some() && p.file_name() == path.file_name());
                    if touches_source && (kind.is_modify() || kind.is_create()) {
                        changed = true;
                    }
                }
                Err(e) => warn!("file watcher error: {}", e),
            }
        }

        if changed {
            match std::fs::read_to_string(&path) {
                Ok(new_text) => {
                    info!("{} changed, reloading", path.display());
                    self.source_text = new_text;
                    self.reload_context();
                }
                Err(e) => warn!("could not re-read {}: {}", path.display(), e),
            }
        }
    }

    fn advance(&mut self, steps: usize) {
        let Some(ref mut ctx) = self.ctx_opt else {
            return;
        };
        if let Err(e) = advance_frame(ctx, steps, &mut self.trails) {
            self.last_load_error = Some(e.to_string());
            self.playing = false;
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                self.playing = !self.playing;
            }

            if ui.button("⏮ Reset").clicked() {
                self.reset();
            }

            if ui.button("⏭ Step").clicked() {
                self.advance(1);
            }

            ui.separator();

            ui.label("Speed:");
            ui.add(egui::Slider::new(&mut self.steps_per_frame, 1..=50).text("steps/frame"));

            ui.label("Trail:");
            if ui
                .add(egui::Slider::new(&mut self.trail_length, 0..=500))
                .changed()
            {
                self.trails.set_max_len(self.trail_length);
            }

            ui.label("Zoom:");
            ui.add(egui::Slider::new(&mut self.scale, 5.0..=1000.0).logarithmic(true));

            ui.separator();

            if let Some(ref ctx) = self.ctx_opt {
                let t = ctx.current_step as f64 * ctx.integrator.params().timestep;
                ui.label(format!("Step: {}   t = {:.3}", ctx.current_step, t));
            }
        });
    }

    fn draw(&self, ui: &mut egui::Ui) {
        let rect = ui.max_rect();
        let painter = ui.painter();
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

        let Some(ref ctx) = self.ctx_opt else {
            return;
        };
        let viewport = Viewport::new(self.scale, rect.center());

        for state in get_body_states(ctx) {
            let color = PALETTE[state.index % PALETTE.len()];

            // Trail fades from transparent (oldest) to the body color
            let points: Vec<egui::Pos2> = self
                .trails
                .points(state.index)
                .map(|p| viewport.to_screen(p))
                .collect();
            let n = points.len().max(1) as f32;
            for (i, seg) in points.windows(2).enumerate() {
                let alpha = ((i + 1) as f32 / n * 200.0) as u8;
                let faded =
                    egui::Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha);
                painter.line_segment([seg[0], seg[1]], egui::Stroke::new(1.5, faded));
            }

            let screen_pos = viewport.to_screen(state.pos);
            let radius = body_radius(state.mass);
            painter.circle_filled(screen_pos, radius, color);

            if let Some(label) = &state.label {
                painter.text(
                    screen_pos + egui::vec2(0.0, radius + 4.0),
                    egui::Align2::CENTER_TOP,
                    label,
                    egui::FontId::proportional(12.0),
                    egui::Color32::WHITE,
                );
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();

        if self.playing {
            self.advance(self.steps_per_frame);
        }

        // Scroll to zoom
        let scroll = ctx.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            let mut viewport = Viewport::new(self.scale, egui::Pos2::ZERO);
            viewport.zoom((scroll * 0.002).exp());
            self.scale = viewport.scale;
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls(ui));

        if let Some(ref error) = self.last_load_error {
            egui::TopBottomPanel::bottom("errors").show(ctx, |ui| {
                ui.set_max_height(100.0);
                ui.label(
                    egui::RichText::new(format!("Error: {}", error)).color(egui::Color32::RED),
                );
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.draw(ui));

        if self.playing {
            ctx.request_repaint();
        }
    }
}

/// Run `steps` integrator steps, then record one trail point per body.
///
/// Stops early on divergence; the trail still gets the last good frame.
fn advance_frame(
    ctx: &mut SimulationContext,
    steps: usize,
    trails: &mut Trails,
) -> Result<(), DivergenceError> {
    let mut result = Ok(());
    for _ in 0..steps {
        if let Err(e) = step_simulation(ctx) {
            result = Err(e);
            break;
        }
    }
    if result.is_ok() {
        trails.record(ctx.integrator.bodies().iter().map(|b| b.pos));
    }
    result
}

fn watch_file(
    path: &Path,
) -> (
    Option<RecommendedWatcher>,
    mpsc::Receiver<notify::Result<Event>>,
) {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        // The receiver is gone during shutdown
        let _ = tx.send(res);
    })
    .ok();

    if let Some(ref mut w) = watcher {
        // Watch the directory so editors that replace the file are still seen
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if let Err(e) = w.watch(dir, notify::RecursiveMode::NonRecursive) {
            warn!("live reload disabled: {}", e);
        }
    }

    (watcher, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: &str = "system G = 1 dt = 0.01 softening = 0.15\n\
                        body a at (0, 0, 0) mass 1\n\
                        body b at (1, 0, 0) velocity (0, 1, 0) mass 0.001\n";

    fn context(source: &str) -> SimulationContext {
        let (mut ctx, _) = build_simulation_context_from_source(source).unwrap();
        ctx.max_steps = None;
        ctx.check_divergence = true;
        ctx
    }

    #[test]
    fn one_trail_point_per_frame() {
        let mut ctx = context(PAIR);
        let mut trails = Trails::new(35);

        for _ in 0..4 {
            advance_frame(&mut ctx, 50, &mut trails).unwrap();
        }

        assert_eq!(ctx.current_step, 200);
        assert_eq!(trails.len(0), 4);
        assert_eq!(trails.len(1), 4);
        let last = trails.points(1).last().unwrap();
        assert_eq!(last, ctx.integrator.bodies()[1].pos);
    }

    #[test]
    fn divergence_skips_the_trail_point() {
        let source = "system G = 1 dt = 0.01 softening = 0\n\
                      body a at (0, 0, 0) mass 1\n\
                      body b at (0, 0, 0) mass 1\n";
        let mut ctx = context(source);
        let mut trails = Trails::new(35);

        assert!(advance_frame(&mut ctx, 10, &mut trails).is_err());
        assert_eq!(ctx.current_step, 1);
        assert_eq!(trails.len(0), 0);
    }
}
