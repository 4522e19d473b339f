mod entity_timestream_map;
mod timestamped_message;

pub use entity_timestream_map::EntityTimestreamMap;
pub use timestamped_message::TimestampedMessage;
