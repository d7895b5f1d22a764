//! Surface deformation module
//!
//! All displacement logic lives here. Like the mesh it writes into, this
//! module is frame-driven and single-threaded:
//! - Time only advances through `tick`
//! - Sources are kept in a table with stable iteration order
//! - No rendering or platform dependencies

pub mod displace;
pub mod pointer;
pub mod ripple;
pub mod sdf;
pub mod spring;
pub mod state;
pub mod tick;

pub use displace::{DisplaceOutcome, displace, sample};
pub use pointer::{PointerParams, PointerState};
pub use ripple::{RippleEvent, RippleParams, RipplePhase, RippleScheduler, RippleUpdate};
pub use sdf::{band_profile, falloff, radial_ease, sd_rounded_box};
pub use spring::Spring;
pub use state::{Rect, RectSource, SourceConfig, SourceId, SurfaceEvent, SurfaceState};
pub use tick::tick;
