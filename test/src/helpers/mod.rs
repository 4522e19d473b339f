pub mod assertions;
pub mod behaviors;
pub mod logging;
pub mod test_timeline;

pub use behaviors::{sample_behaviors, ACCELERATE, SELF_DESTRUCT};
pub use logging::init_logger;
pub use test_timeline::{TestTimeline, TestTimelineBuilder};
