use web_time::Instant;

use strata_core::{Color, Rect, Vec2};
use strata_scene::{CommandSink, FontMetrics, Layer, Primitive, RenderCommand, Scene};

/// Widget orders past anything a scene hands out, so HUD commands appended
/// to a sorted list stay sorted.
const STATS_ORDER: u32 = u32::MAX - 1;
const OUTLINE_ORDER: u32 = u32::MAX;

pub struct Hud {
    pub inspector_enabled: bool,
    pub hovered: Option<Rect>,
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
    pub metrics: Option<Metrics>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            hovered: None,
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
            metrics: None,
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
        log::debug!("Hud: inspector {}", if self.inspector_enabled { "on" } else { "off" });
    }

    pub fn set_hovered(&mut self, r: Option<Rect>) {
        self.hovered = r;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f32 {
        self.fps_smooth
    }

    fn tick(&mut self, now: Instant) {
        self.frame_count += 1;
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = now.duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                // simple EMA
                let a = 0.2;
                self.fps_smooth = if self.fps_smooth == 0.0 {
                    fps
                } else {
                    (1.0 - a) * self.fps_smooth + a * fps
                };
            }
        }
    }

    pub fn stats_line(&self) -> String {
        let mut parts = vec![
            format!("frame: {}", self.frame_count),
            format!("fps: {:.1}", self.fps_smooth),
        ];
        if let Some(m) = &self.metrics {
            parts.push(format!("update: {:.2} ms", m.update_ms));
            parts.push(format!("nodes: {}", m.scene_nodes));
            parts.push(format!("commands: {}", m.commands));
        }
        parts.join("  |  ")
    }

    /// Appends the stats panel and the hovered outline to an already sorted
    /// command list.
    pub fn overlay(&mut self, commands: &mut Vec<RenderCommand>, fonts: Option<&dyn FontMetrics>) {
        self.overlay_at(Instant::now(), commands, fonts);
    }

    fn overlay_at(
        &mut self,
        now: Instant,
        commands: &mut Vec<RenderCommand>,
        fonts: Option<&dyn FontMetrics>,
    ) {
        self.tick(now);
        let text = self.stats_line();

        let origin = Vec2::new(8.0, 8.0);
        let (width, height) = match fonts {
            Some(f) => (f.advance(&text, 0.5), f.line_height(0.5)),
            None => (text.chars().count() as f32 * 7.0, 16.0),
        };

        let mut sink = CommandSink::new(commands, Layer::Overlay, STATS_ORDER);
        sink.set_z(1.0);
        sink.push(Primitive::solid(
            Rect::new(origin.x - 4.0, origin.y - 4.0, width + 8.0, height + 8.0),
            Color::new(0.0, 0.0, 0.0, 0.6),
        ));
        if let Some(f) = fonts {
            let color = Color::from_hex("#AAAAAA");
            let mut pen = origin;
            for ch in text.chars() {
                let Some(g) = f.glyph(ch, 0.5) else {
                    continue;
                };
                if g.size.width > 0.0 && g.size.height > 0.0 {
                    sink.push(Primitive::Glyph {
                        rect: Rect::new(
                            pen.x + g.offset.x,
                            pen.y + g.offset.y,
                            g.size.width,
                            g.size.height,
                        ),
                        uv0: g.uv0,
                        uv1: g.uv1,
                        color,
                    });
                }
                pen.x += g.advance;
            }
        }

        if let Some(r) = self.hovered {
            let mut sink = CommandSink::new(commands, Layer::Overlay, OUTLINE_ORDER);
            sink.set_z(1.0);
            let color = Color::from_hex("#44AAFF");
            let t = 2.0;
            for edge in [
                Rect::new(r.x, r.y, r.w, t),
                Rect::new(r.x, r.bottom() - t, r.w, t),
                Rect::new(r.x, r.y, t, r.h),
                Rect::new(r.right() - t, r.y, t, r.h),
            ] {
                sink.push(Primitive::solid(edge, color));
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub update_ms: f32,
    pub scene_nodes: usize,
    pub commands: usize,
}

pub struct Inspector {
    pub hud: Hud,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self { hud: Hud::new() }
    }

    /// Call after `Scene::compose`. Does nothing while the inspector is off.
    pub fn frame(
        &mut self,
        scene: &Scene,
        update_ms: f32,
        commands: &mut Vec<RenderCommand>,
        fonts: Option<&dyn FontMetrics>,
    ) {
        if !self.hud.inspector_enabled {
            return;
        }
        let tree = scene.tree();
        let hovered = scene
            .input()
            .hovered()
            .and_then(|id| tree.node(id))
            .map(|n| n.screen_rect);
        self.hud.set_hovered(hovered);
        self.hud.metrics = Some(Metrics {
            update_ms,
            scene_nodes: tree.len(),
            commands: commands.len(),
        });
        self.hud.overlay(commands, fonts);
    }
}
