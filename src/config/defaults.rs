//! Default configuration values.

use crate::chat::executor::MAX_RETRIES;
use crate::config::{ChatConfig, GeneralConfig, LayoutConfig};
use crate::graph::FrontmanPolicy;
use crate::layout::{
    LayoutMode, BASE_RADIUS, DEFAULT_FRONTMAN_X_POS, DEFAULT_FRONTMAN_Y_POS, LEVEL_SPACING, NODE_HEIGHT,
    NODE_WIDTH,
};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_USER: &str = "anonymous";
pub const DEFAULT_RANK_SEPARATION: f64 = 50.0;
pub const DEFAULT_NODE_SEPARATION: f64 = 50.0;

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center_x: DEFAULT_FRONTMAN_X_POS,
            center_y: DEFAULT_FRONTMAN_Y_POS,
            base_radius: BASE_RADIUS,
            level_spacing: LEVEL_SPACING,
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            rank_separation: DEFAULT_RANK_SEPARATION,
            node_separation: DEFAULT_NODE_SEPARATION,
            default_mode: LayoutMode::Radial,
            frontman_policy: FrontmanPolicy::Degrade,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: MAX_RETRIES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user: DEFAULT_USER.to_string(),
        }
    }
}
