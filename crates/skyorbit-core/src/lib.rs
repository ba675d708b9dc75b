pub mod animator;
pub mod config;
pub mod controller;
pub mod host;
pub mod interaction;
pub mod math;
pub mod setup;
pub mod sim;

pub use animator::{AnimatorState, OrbitAnimator};
pub use config::{OrbitConfig, SetupConfig};
pub use controller::{Lifecycle, OrbitController};
pub use host::{
    EventResult, FrameHandle, FrameScheduler, HostEvent, InputEvent, InputKind, InputSource,
    MonotonicStopwatch, SceneHost, Stopwatch, TimerHandle, TimerScheduler,
};
pub use interaction::{InteractionState, InteractionTracker};
pub use math::Vec3;
pub use setup::{Bounds, NavigationLocks, Projection, ViewFace, ViewSetup};
pub use sim::{SimClock, SimHost, SimInput, SimStopwatch, Simulation};
