//! Commands for the 3D scene widget.
//!
//! The widget itself is not part of this crate; it only needs to know how
//! big the central object is, what color it has, and how many data
//! particles float around it.

use serde::Serialize;
use serde_json::Value;

use crate::shape::numeric;

/// Object color when many hot leads are waiting.
pub const HOT_COLOR: u32 = 0xff006e;
/// Object color otherwise.
pub const CALM_COLOR: u32 = 0x00ff41;

const HOT_LEADS_THRESHOLD: f64 = 10.0;
const MIN_SCALE: f64 = 0.5;
const DEFAULT_PARTICLES: usize = 10;
const MAX_PARTICLES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum SceneCommand {
    /// Uniform scale of the central object.
    Scale(f64),
    /// Central object color as `0xRRGGBB`.
    Color(u32),
    ClearParticles,
    SpawnParticles(usize),
}

/// Scene update for a payload, in application order.
pub fn scene_commands(body: &Value) -> Vec<SceneCommand> {
    let mut commands = Vec::new();

    if let Some(summary) = body.pointer("/data/summary").and_then(Value::as_object) {
        let field = |name: &str| summary.get(name).and_then(numeric).unwrap_or(0.0);

        commands.push(SceneCommand::Scale((field("total_clients") / 100.0).max(MIN_SCALE)));
        commands.push(SceneCommand::Color(if field("hot_leads") > HOT_LEADS_THRESHOLD {
            HOT_COLOR
        } else {
            CALM_COLOR
        }));
    }

    let items = body
        .get("data")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let particles = if items == 0 { DEFAULT_PARTICLES } else { items };

    commands.push(SceneCommand::ClearParticles);
    commands.push(SceneCommand::SpawnParticles(particles.min(MAX_PARTICLES)));
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_sets_scale_and_color() {
        let body = json!({"data": {"summary": {"total_clients": 250, "hot_leads": 11}}});
        assert_eq!(
            scene_commands(&body),
            vec![
                SceneCommand::Scale(2.5),
                SceneCommand::Color(HOT_COLOR),
                SceneCommand::ClearParticles,
                SceneCommand::SpawnParticles(DEFAULT_PARTICLES),
            ]
        );
    }

    #[test]
    fn small_summary_keeps_minimum_scale() {
        let body = json!({"data": {"summary": {"total_clients": 10, "hot_leads": 10}}});
        let commands = scene_commands(&body);
        assert_eq!(commands[0], SceneCommand::Scale(MIN_SCALE));
        assert_eq!(commands[1], SceneCommand::Color(CALM_COLOR));
    }

    #[test]
    fn particle_count_follows_array_length() {
        let items: Vec<_> = (0..7).map(|i| json!({"id": i})).collect();
        let commands = scene_commands(&json!({"data": items}));
        assert_eq!(commands, vec![SceneCommand::ClearParticles, SceneCommand::SpawnParticles(7)]);

        let many: Vec<_> = (0..80).collect();
        let commands = scene_commands(&json!({"data": many}));
        assert_eq!(commands.last(), Some(&SceneCommand::SpawnParticles(MAX_PARTICLES)));
    }

    #[test]
    fn commands_serialize_with_op_tag() {
        let value = serde_json::to_value(SceneCommand::SpawnParticles(3)).unwrap();
        assert_eq!(value, json!({"op": "spawn_particles", "value": 3}));
        let value = serde_json::to_value(SceneCommand::ClearParticles).unwrap();
        assert_eq!(value, json!({"op": "clear_particles"}));
    }
}
