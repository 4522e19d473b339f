mod timeline_api;

pub use timeline_api::{TimelineApi, TimelineLink};
