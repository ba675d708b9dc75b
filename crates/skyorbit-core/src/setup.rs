use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SetupConfig;
use crate::host::SceneHost;
use crate::math::Vec3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationLocks {
    pub pan: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFace {
    #[default]
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Clone, Debug)]
pub struct ViewSetup {
    config: SetupConfig,
    configured: bool,
    home_captured: bool,
}

impl ViewSetup {
    pub fn new(config: SetupConfig) -> Self {
        Self {
            config,
            configured: false,
            home_captured: false,
        }
    }

    pub fn is_home_captured(&self) -> bool {
        self.home_captured
    }

    pub fn framing(&self) -> Bounds {
        Bounds::new(
            Vec3::from(self.config.framing_min),
            Vec3::from(self.config.framing_max),
        )
    }

    pub fn configure<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.configured {
            return false;
        }
        host.lock_navigation(NavigationLocks {
            pan: self.config.lock_pan,
        });
        host.fit_bounds(self.framing(), true);
        host.set_view_face(self.config.view_face);
        host.set_projection(self.config.projection);
        self.configured = true;
        debug!(
            lock_pan = self.config.lock_pan,
            face = ?self.config.view_face,
            projection = ?self.config.projection,
            "navigation configured"
        );
        true
    }

    pub fn capture_home<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.configured || self.home_captured {
            return false;
        }
        host.capture_home_view();
        self.home_captured = true;
        info!("home view captured");
        true
    }
}
