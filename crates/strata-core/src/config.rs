use crate::config_tree::ConfigNode;

/// Tunables shared by every stage of the frame pipeline.
///
/// `Default` gives the values the engine was tuned with; hosts can override
/// individual keys from a `settings` map via [`SceneConfig::apply_overrides`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneConfig {
    /// Maximum live nodes per tree.
    pub node_capacity: usize,
    /// Maximum specs per loaded store (templates and their copies included).
    pub spec_capacity: usize,

    // layout
    pub default_width: f32,
    pub default_height: f32,
    pub char_width_estimate: f32,
    pub layout_infinity: f32,
    pub trace_layout: bool,

    // animation
    pub hover_speed: f32,

    // input
    pub drag_threshold_sq: f32,
    pub node_wheel_step: f32,
    pub event_queue_capacity: usize,

    // scroll areas
    pub area_wheel_step: f32,
    pub scroll_smoothing: f32,
    pub scroll_snap: f32,
    pub overflow_epsilon: f32,
    pub viewport_dwarf_ratio: f32,
    pub min_thumb: f32,
    pub min_track_width: f32,
    pub track_width_ratio: f32,

    // compositor
    pub overlay_base_z: f32,
    pub text_scale: f32,
    pub caret_width: f32,
    pub caret_height: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            node_capacity: 4096,
            spec_capacity: 16384,
            default_width: 100.0,
            default_height: 30.0,
            char_width_estimate: 10.0,
            layout_infinity: 10000.0,
            trace_layout: false,
            hover_speed: 10.0,
            drag_threshold_sq: 9.0,
            node_wheel_step: 24.0,
            event_queue_capacity: 64,
            area_wheel_step: 120.0,
            scroll_smoothing: 10.0,
            scroll_snap: 0.1,
            overflow_epsilon: 1.0,
            viewport_dwarf_ratio: 0.5,
            min_thumb: 12.0,
            min_track_width: 4.0,
            track_width_ratio: 0.02,
            overlay_base_z: 0.8,
            text_scale: 0.5,
            caret_width: 2.0,
            caret_height: 20.0,
        }
    }
}

impl SceneConfig {
    /// Applies every recognised key of a `settings` map. Unknown keys and
    /// unparsable values are logged and skipped.
    pub fn apply_overrides(&mut self, settings: &ConfigNode) {
        for (key, val) in settings.entries() {
            let applied = match key.as_str() {
                "node_capacity" => set_usize(&mut self.node_capacity, val),
                "spec_capacity" => set_usize(&mut self.spec_capacity, val),
                "event_queue_capacity" => set_usize(&mut self.event_queue_capacity, val),
                "trace_layout" => val.as_bool().map(|b| self.trace_layout = b).is_some(),
                "default_width" => set_f32(&mut self.default_width, val),
                "default_height" => set_f32(&mut self.default_height, val),
                "char_width_estimate" => set_f32(&mut self.char_width_estimate, val),
                "layout_infinity" => set_f32(&mut self.layout_infinity, val),
                "hover_speed" => set_f32(&mut self.hover_speed, val),
                "drag_threshold_sq" => set_f32(&mut self.drag_threshold_sq, val),
                "node_wheel_step" => set_f32(&mut self.node_wheel_step, val),
                "area_wheel_step" => set_f32(&mut self.area_wheel_step, val),
                "scroll_smoothing" => set_f32(&mut self.scroll_smoothing, val),
                "scroll_snap" => set_f32(&mut self.scroll_snap, val),
                "overflow_epsilon" => set_f32(&mut self.overflow_epsilon, val),
                "viewport_dwarf_ratio" => set_f32(&mut self.viewport_dwarf_ratio, val),
                "min_thumb" => set_f32(&mut self.min_thumb, val),
                "min_track_width" => set_f32(&mut self.min_track_width, val),
                "track_width_ratio" => set_f32(&mut self.track_width_ratio, val),
                "overlay_base_z" => set_f32(&mut self.overlay_base_z, val),
                "text_scale" => set_f32(&mut self.text_scale, val),
                "caret_width" => set_f32(&mut self.caret_width, val),
                "caret_height" => set_f32(&mut self.caret_height, val),
                _ => {
                    log::warn!("SceneConfig: unknown setting '{}' (line {})", key, val.line);
                    continue;
                }
            };
            if !applied {
                log::warn!(
                    "SceneConfig: bad value for '{}' (line {}), keeping default",
                    key,
                    val.line
                );
            }
        }
    }
}

fn set_f32(slot: &mut f32, val: &ConfigNode) -> bool {
    val.as_f32().map(|v| *slot = v).is_some()
}

fn set_usize(slot: &mut usize, val: &ConfigNode) -> bool {
    val.as_str()
        .and_then(|s| s.trim().parse().ok())
        .map(|v| *slot = v)
        .is_some()
}
