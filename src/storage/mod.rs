mod reader;
mod schema;
mod writer;

pub use reader::{TraceReader, TraceStats};
pub use schema::SCHEMA_VERSION;
pub use writer::TraceWriter;
