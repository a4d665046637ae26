pub mod ball;
pub mod config;
pub mod contact;
pub mod curve;
pub mod launcher;
pub mod layout;
pub mod paddle;
pub mod snapshot;
pub mod surface;
pub mod table;
pub mod trajectory;

pub use ball::{BallAgent, BallSet, BallState};
pub use config::{ConfigError, TableConfig};
pub use contact::{ContactEvent, ContactPhase, ContactTarget};
pub use launcher::{DragLaunchController, DragRelease, RestAnchor};
pub use layout::{TableLayout, default_layout};
pub use paddle::{HitReceiver, PaddleAgent};
pub use snapshot::{SnapshotError, TableSnapshot};
pub use surface::{Shape, SurfaceKind, SurfaceSet, SweepQuery};
pub use table::Table;
pub use trajectory::{TrajectoryParams, TrajectoryPredictor};
