pub mod director;
pub mod easing;
pub mod tween;

pub use director::{TransitionDirector, ViewChange, ViewerEvents, wrap_index};
pub use easing::Easing;
pub use tween::{TweenFrame, TweenState, TweenTick};
